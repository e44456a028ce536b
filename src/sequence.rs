//! Multi-register device routines used by the ranging state machine.
//!
//! These follow ST's VL53L0X API bring-up: data init, static init with the
//! reference SPAD selection and tuning table, single reference calibrations,
//! timing budget and VCSEL period programming.

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use embedded_hal::digital::OutputPin;

use crate::clock::Clock;
use crate::codec::{self, SequenceStepEnables, SequenceStepTimeouts};
use crate::error::{Error, TimeoutKind};
use crate::profile::RangingProfile;
use crate::ranging::RangingStateMachine;
use crate::register::{Register, DEFAULT_TUNING};

/// Sequence steps kept enabled for ranging: DSS, pre-range and final range.
const RANGING_SEQUENCE: u8 = 0xE8;

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E, EN, D, C> RangingStateMachine<I2C, EN, D, C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
    EN: OutputPin,
    D: DelayNs,
    C: Clock,
{
    /// 2V8 pad mode, stop variable capture and limit-check setup.
    pub(crate) async fn data_init(&mut self) -> Result<(), Error<E>> {
        let pad = self
            .bus
            .read_byte(Register::VhvConfigPadSclSdaExtsupHv)
            .await?;
        self.bus
            .write_byte(Register::VhvConfigPadSclSdaExtsupHv, pad | 0x01)
            .await?;
        // standard I2C mode
        self.bus.write_byte(0x88u8, 0x00).await?;

        self.bus
            .write_table(&[(0x80, 0x01), (0xFF, 0x01), (0x00, 0x00)])
            .await?;
        self.stop_variable = self.bus.read_byte(0x91u8).await?;
        self.bus
            .write_table(&[(0x00, 0x01), (0xFF, 0x00), (0x80, 0x00)])
            .await?;

        // disable the MSRC and pre-range signal rate limit checks
        let control = self.bus.read_byte(Register::MsrcConfigControl).await?;
        self.bus
            .write_byte(Register::MsrcConfigControl, control | 0x12)
            .await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, 0xFF)
            .await?;
        debug!("data init done, stop variable {}", self.stop_variable);
        Ok(())
    }

    /// Reference SPAD selection, tuning table and interrupt configuration.
    pub(crate) async fn static_init(&mut self) -> Result<(), Error<E>> {
        let (count, aperture) = self.spad_info().await?;
        debug!("reference SPADs: {} (aperture {})", count, aperture);

        let mut map = [0u8; 6];
        self.bus
            .read_multi(Register::GlobalConfigSpadEnablesRef0, &mut map)
            .await?;
        self.bus
            .write_table(&[
                (0xFF, 0x01),
                (u8::from(Register::DynamicSpadRefEnStartOffset), 0x00),
                (u8::from(Register::DynamicSpadNumRequestedRefSpad), 0x2C),
                (0xFF, 0x00),
                (u8::from(Register::GlobalConfigRefEnStartSelect), 0xB4),
            ])
            .await?;
        codec::select_reference_spads(&mut map, count, aperture);
        self.bus
            .write_multi(Register::GlobalConfigSpadEnablesRef0, &map)
            .await?;

        self.bus.write_table(&DEFAULT_TUNING).await?;

        // new sample ready, active low
        self.bus
            .write_byte(Register::SystemInterruptConfigGpio, 0x04)
            .await?;
        let mux = self.bus.read_byte(Register::GpioHvMuxActiveHigh).await?;
        self.bus
            .write_byte(Register::GpioHvMuxActiveHigh, mux & !0x10)
            .await?;
        self.bus
            .write_byte(Register::SystemInterruptClear, 0x01)
            .await?;

        let budget = self.read_timing_budget().await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, RANGING_SEQUENCE)
            .await?;
        self.set_timing_budget(budget).await
    }

    /// Reads the reference SPAD count and type from NVM.
    async fn spad_info(&mut self) -> Result<(u8, bool), Error<E>> {
        self.bus
            .write_table(&[(0x80, 0x01), (0xFF, 0x01), (0x00, 0x00), (0xFF, 0x06)])
            .await?;
        let v = self.bus.read_byte(0x83u8).await?;
        self.bus.write_byte(0x83u8, v | 0x04).await?;
        self.bus
            .write_table(&[
                (0xFF, 0x07),
                (0x81, 0x01),
                (0x80, 0x01),
                (0x94, 0x6B),
                (0x83, 0x00),
            ])
            .await?;

        let mut deadline = self.deadline_after(self.config.bus_timeout_ms());
        loop {
            if self.bus.read_byte(0x83u8).await? != 0x00 {
                break Ok(());
            }
            if self.poll_expired(&mut deadline) {
                break Err(Error::Timeout(TimeoutKind::Calibration));
            }
            self.delay.delay_ms(1).await;
        }?;

        self.bus.write_byte(0x83u8, 0x01).await?;
        let info = self.bus.read_byte(0x92u8).await?;

        self.bus.write_table(&[(0x81, 0x00), (0xFF, 0x06)]).await?;
        let v = self.bus.read_byte(0x83u8).await?;
        self.bus.write_byte(0x83u8, v & !0x04).await?;
        self.bus
            .write_table(&[(0xFF, 0x01), (0x00, 0x01), (0xFF, 0x00), (0x80, 0x00)])
            .await?;

        Ok((info & 0x7F, info & 0x80 != 0))
    }

    /// VHV then phase calibration, leaving the ranging sequence enabled.
    pub(crate) async fn reference_calibration(&mut self) -> Result<(), Error<E>> {
        self.bus
            .write_byte(Register::SystemSequenceConfig, 0x01)
            .await?;
        self.single_ref_calibration(0x40).await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, 0x02)
            .await?;
        self.single_ref_calibration(0x00).await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, RANGING_SEQUENCE)
            .await?;
        Ok(())
    }

    /// Phase calibration alone, needed after a VCSEL period change.
    pub(crate) async fn phase_calibration(&mut self) -> Result<(), Error<E>> {
        let sequence = self.bus.read_byte(Register::SystemSequenceConfig).await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, 0x02)
            .await?;
        self.single_ref_calibration(0x00).await?;
        self.bus
            .write_byte(Register::SystemSequenceConfig, sequence)
            .await?;
        Ok(())
    }

    async fn single_ref_calibration(&mut self, vhv_init: u8) -> Result<(), Error<E>> {
        self.bus
            .write_byte(Register::SysrangeStart, 0x01 | vhv_init)
            .await?;

        let mut deadline = self.deadline_after(u64::from(self.config.reading_timeout_ms));
        loop {
            let status = self.bus.read_byte(Register::ResultInterruptStatus).await?;
            if status & 0x07 != 0 {
                break Ok(());
            }
            if self.poll_expired(&mut deadline) {
                break Err(Error::Timeout(TimeoutKind::Calibration));
            }
            self.delay.delay_ms(1).await;
        }?;

        self.bus
            .write_byte(Register::SystemInterruptClear, 0x01)
            .await?;
        self.bus.write_byte(Register::SysrangeStart, 0x00).await?;
        Ok(())
    }

    async fn sequence_step_enables(&mut self) -> Result<SequenceStepEnables, Error<E>> {
        let config = self.bus.read_byte(Register::SystemSequenceConfig).await?;
        Ok(SequenceStepEnables::from(config))
    }

    async fn sequence_step_timeouts(
        &mut self,
        enables: SequenceStepEnables,
    ) -> Result<SequenceStepTimeouts, Error<E>> {
        let pre_range_vcsel_pclks =
            codec::decode_vcsel_period(self.bus.read_byte(Register::PreRangeVcselPeriod).await?);
        let msrc_dss_tcc_mclks =
            u32::from(self.bus.read_byte(Register::MsrcConfigTimeoutMacrop).await?) + 1;
        let pre_range_mclks =
            codec::decode_timeout(self.bus.read_word(Register::PreRangeTimeoutMacrop).await?)
                .map_err(Error::Protocol)?;

        let final_range_vcsel_pclks =
            codec::decode_vcsel_period(self.bus.read_byte(Register::FinalRangeVcselPeriod).await?);
        let mut final_range_mclks =
            codec::decode_timeout(self.bus.read_word(Register::FinalRangeTimeoutMacrop).await?)
                .map_err(Error::Protocol)?;
        if enables.pre_range {
            final_range_mclks = final_range_mclks.saturating_sub(pre_range_mclks);
        }
        let to_us = |mclks: u32, pclks: u8| -> Result<u32, Error<E>> {
            codec::timeout_mclks_to_us(mclks, pclks).map_err(Error::Protocol)
        };

        Ok(SequenceStepTimeouts {
            pre_range_vcsel_pclks,
            final_range_vcsel_pclks,
            msrc_dss_tcc_mclks,
            pre_range_mclks,
            final_range_mclks,
            msrc_dss_tcc_us: to_us(msrc_dss_tcc_mclks, pre_range_vcsel_pclks)?,
            pre_range_us: to_us(pre_range_mclks, pre_range_vcsel_pclks)?,
            final_range_us: to_us(final_range_mclks, final_range_vcsel_pclks)?,
        })
    }

    /// Timing budget currently programmed on the device, in µs.
    pub(crate) async fn read_timing_budget(&mut self) -> Result<u32, Error<E>> {
        let enables = self.sequence_step_enables().await?;
        let timeouts = self.sequence_step_timeouts(enables).await?;
        let budget =
            codec::measurement_timing_budget_us(enables, &timeouts).map_err(Error::Protocol)?;
        self.timing_budget_us = budget;
        Ok(budget)
    }

    /// Programs the final range timeout so one measurement takes `budget_us`.
    ///
    /// # Errors
    ///
    /// * `Error::Protocol` - the budget leaves no room for the final range or overflows
    /// * `Error::Bus` - If there was an I2C communication error
    pub(crate) async fn set_timing_budget(&mut self, budget_us: u32) -> Result<(), Error<E>> {
        let enables = self.sequence_step_enables().await?;
        let timeouts = self.sequence_step_timeouts(enables).await?;
        let encoded =
            codec::final_range_timeout(budget_us, enables, &timeouts).map_err(Error::Protocol)?;
        if let Some(reg) = encoded {
            self.bus
                .write_word(Register::FinalRangeTimeoutMacrop, reg)
                .await?;
        }
        self.timing_budget_us = budget_us;
        Ok(())
    }

    /// Programs the profile's VCSEL periods where they differ from the
    /// device's. Returns whether anything changed.
    pub(crate) async fn set_vcsel_periods(
        &mut self,
        profile: &RangingProfile,
    ) -> Result<bool, Error<E>> {
        let enables = self.sequence_step_enables().await?;
        let timeouts = self.sequence_step_timeouts(enables).await?;
        let mut changed = false;

        if timeouts.pre_range_vcsel_pclks != profile.pre_range_vcsel_pclks {
            self.set_pre_range_vcsel(profile.pre_range_vcsel_pclks, &timeouts)
                .await?;
            changed = true;
        }
        if timeouts.final_range_vcsel_pclks != profile.final_range_vcsel_pclks {
            // the pre-range timeout is part of the final range register
            let timeouts = if changed {
                self.sequence_step_timeouts(enables).await?
            } else {
                timeouts
            };
            self.set_final_range_vcsel(profile.final_range_vcsel_pclks, enables, &timeouts)
                .await?;
            changed = true;
        }
        Ok(changed)
    }

    async fn set_pre_range_vcsel(
        &mut self,
        pclks: u8,
        timeouts: &SequenceStepTimeouts,
    ) -> Result<(), Error<E>> {
        let phase_high = codec::pre_range_phase_high(pclks).map_err(Error::Protocol)?;
        let pre_range = codec::timeout_us_to_mclks(timeouts.pre_range_us, pclks)
            .map_err(Error::Protocol)?;
        let msrc = codec::timeout_us_to_mclks(timeouts.msrc_dss_tcc_us, pclks)
            .map_err(Error::Protocol)?;
        debug!("pre-range VCSEL period {} PCLKs", pclks);

        self.bus
            .write_byte(Register::PreRangeValidPhaseHigh, phase_high)
            .await?;
        self.bus
            .write_byte(Register::PreRangeValidPhaseLow, 0x08)
            .await?;
        self.bus
            .write_byte(Register::PreRangeVcselPeriod, codec::encode_vcsel_period(pclks))
            .await?;
        self.bus
            .write_word(Register::PreRangeTimeoutMacrop, codec::encode_timeout(pre_range))
            .await?;
        self.bus
            .write_byte(Register::MsrcConfigTimeoutMacrop, codec::encode_msrc_timeout(msrc))
            .await?;
        Ok(())
    }

    async fn set_final_range_vcsel(
        &mut self,
        pclks: u8,
        enables: SequenceStepEnables,
        timeouts: &SequenceStepTimeouts,
    ) -> Result<(), Error<E>> {
        let settings = codec::final_range_vcsel_settings(pclks).map_err(Error::Protocol)?;
        let mut final_range = codec::timeout_us_to_mclks(timeouts.final_range_us, pclks)
            .map_err(Error::Protocol)?;
        if enables.pre_range {
            final_range = final_range.saturating_add(timeouts.pre_range_mclks);
        }
        debug!("final-range VCSEL period {} PCLKs", pclks);

        self.bus
            .write_byte(Register::FinalRangeValidPhaseHigh, settings.phase_high)
            .await?;
        self.bus
            .write_byte(Register::FinalRangeValidPhaseLow, 0x08)
            .await?;
        self.bus
            .write_byte(Register::GlobalConfigVcselWidth, settings.vcsel_width)
            .await?;
        self.bus
            .write_byte(Register::AlgoPhasecalConfigTimeout, settings.phasecal_timeout)
            .await?;
        // phase calibration limit lives at the same index on page 1
        self.bus
            .write_table(&[(0xFF, 0x01), (0x30, settings.phasecal_limit), (0xFF, 0x00)])
            .await?;
        self.bus
            .write_byte(Register::FinalRangeVcselPeriod, codec::encode_vcsel_period(pclks))
            .await?;
        self.bus
            .write_word(Register::FinalRangeTimeoutMacrop, codec::encode_timeout(final_range))
            .await?;
        Ok(())
    }

    /// Restores the stop variable and starts one range.
    pub(crate) async fn start_single_shot(&mut self) -> Result<(), Error<E>> {
        let stop_variable = self.stop_variable;
        self.bus
            .write_table(&[
                (0x80, 0x01),
                (0xFF, 0x01),
                (0x00, 0x00),
                (0x91, stop_variable),
                (0x00, 0x01),
                (0xFF, 0x00),
                (0x80, 0x00),
            ])
            .await?;
        self.bus.write_byte(Register::SysrangeStart, 0x01).await?;
        Ok(())
    }

    /// Pulses the active-low software reset.
    pub(crate) async fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.bus
            .write_byte(Register::SoftResetGo2SoftResetN, 0x00)
            .await?;
        self.delay.delay_ms(1).await;
        self.bus
            .write_byte(Register::SoftResetGo2SoftResetN, 0x01)
            .await?;
        self.delay.delay_ms(2).await;
        Ok(())
    }
}
