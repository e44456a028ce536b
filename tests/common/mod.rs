//! Register-level VL53L0X simulation shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use vl53l0x_ranging::{NoEnablePin, SensorConfig, Vl53l0x};

/// Simulated milliseconds shared by the bus, the delay and the driver clock.
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }

    pub fn source(&self) -> impl Fn() -> u64 {
        let inner = self.0.clone();
        move || inner.get()
    }
}

/// Delay that only moves the simulated clock.
pub struct FakeDelay {
    clock: SimClock,
    pending_ns: u64,
}

impl FakeDelay {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            pending_ns: 0,
        }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pending_ns += u64::from(ns);
        self.clock.advance(self.pending_ns / 1_000_000);
        self.pending_ns %= 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(u64::from(ms));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBusError {
    Nack,
    Fault,
}

impl i2c::Error for FakeBusError {
    fn kind(&self) -> ErrorKind {
        match self {
            FakeBusError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            FakeBusError::Fault => ErrorKind::Bus,
        }
    }
}

/// Device side of the simulation.
pub struct Device {
    /// Address the device answers on
    pub address: u8,
    page: u8,
    regs: HashMap<(u8, u8), u8>,
    /// Simulated time every bus transaction takes
    pub latency_ms: u64,
    /// Ranging requests never raise the interrupt
    pub stalled: bool,
    /// Every transaction fails
    pub bus_fault: bool,
    /// Interrupt status reported when a range completes
    pub ready_status: u8,
    /// Register writes received, page selects excluded
    pub writes: usize,
    /// Ranging requests received
    pub ranges_started: usize,
    /// Page-0 registers that read back a fixed value whatever was written
    pub stuck: HashMap<u8, u8>,
}

impl Device {
    fn new() -> Self {
        let mut regs = HashMap::new();
        regs.insert((0, 0xC0), 0xEE);
        // stop variable
        regs.insert((1, 0x91), 0x3C);
        // five aperture reference SPADs
        regs.insert((7, 0x92), 0x85);
        for i in 0..6 {
            regs.insert((0, 0xB0 + i), 0xFF);
        }
        regs.insert((0, 0x84), 0x11);
        // power-on VCSEL periods: 14 and 10 PCLKs
        regs.insert((0, 0x50), 0x06);
        regs.insert((0, 0x70), 0x04);
        let mut device = Self {
            address: 0x29,
            page: 0,
            regs,
            latency_ms: 0,
            stalled: false,
            bus_fault: false,
            ready_status: 0x07,
            writes: 0,
            ranges_started: 0,
            stuck: HashMap::new(),
        };
        device.set_result(11, 523, 10.0, 0.5);
        device
    }

    /// Loads the result block returned by the next ranges.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_result(&mut self, status: u8, range_mm: u16, signal_mcps: f32, ambient_mcps: f32) {
        let mut block = [0u8; 12];
        block[0] = status << 3;
        block[2..4].copy_from_slice(&(40u16 << 8).to_be_bytes());
        block[6..8].copy_from_slice(&((signal_mcps * 128.0) as u16).to_be_bytes());
        block[8..10].copy_from_slice(&((ambient_mcps * 128.0) as u16).to_be_bytes());
        block[10..12].copy_from_slice(&range_mm.to_be_bytes());
        for (i, byte) in block.iter().enumerate() {
            self.regs.insert((0, 0x14 + i as u8), *byte);
        }
    }

    /// Page-0 register value.
    pub fn reg(&self, reg: u8) -> u8 {
        self.page_reg(0, reg)
    }

    /// Page-0 big-endian word.
    pub fn word(&self, reg: u8) -> u16 {
        u16::from_be_bytes([self.reg(reg), self.reg(reg + 1)])
    }

    pub fn page_reg(&self, page: u8, reg: u8) -> u8 {
        self.regs.get(&(page, reg)).copied().unwrap_or(0)
    }

    pub fn set_reg(&mut self, page: u8, reg: u8, value: u8) {
        self.regs.insert((page, reg), value);
    }

    fn read(&self, reg: u8) -> u8 {
        match (self.page, reg) {
            // NVM read strobe is always ready
            (7, 0x83) => 0x10,
            (0, reg) if self.stuck.contains_key(&reg) => self.stuck[&reg],
            (page, reg) => self.page_reg(page, reg),
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        if reg == 0xFF {
            self.page = value;
            return;
        }
        self.writes += 1;
        match (self.page, reg) {
            (0, 0x00) if value & 0x01 != 0 => {
                self.ranges_started += 1;
                self.set_reg(0, 0x00, value & !0x01);
                if !self.stalled {
                    self.set_reg(0, 0x13, self.ready_status);
                }
            }
            (0, 0x0B) => {
                self.set_reg(0, 0x0B, value);
                self.set_reg(0, 0x13, 0x00);
            }
            (0, 0x8A) => self.address = value & 0x7F,
            (page, reg) => self.set_reg(page, reg, value),
        }
    }
}

/// Bus handle onto a simulated device. Clones share the device.
#[derive(Clone)]
pub struct FakeSensor {
    device: Rc<RefCell<Device>>,
    clock: SimClock,
}

impl FakeSensor {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            device: Rc::new(RefCell::new(Device::new())),
            clock: clock.clone(),
        }
    }

    pub fn device(&self) -> std::cell::RefMut<'_, Device> {
        self.device.borrow_mut()
    }
}

impl ErrorType for FakeSensor {
    type Error = FakeBusError;
}

impl I2c for FakeSensor {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut device = self.device.borrow_mut();
        self.clock.advance(device.latency_ms);
        if device.bus_fault {
            return Err(FakeBusError::Fault);
        }
        if address != device.address {
            return Err(FakeBusError::Nack);
        }

        let mut index: Option<u8> = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        match index {
                            None => index = Some(byte),
                            Some(reg) => {
                                device.write(reg, byte);
                                index = Some(reg.wrapping_add(1));
                            }
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let mut reg = index.unwrap_or(0);
                    for byte in buffer.iter_mut() {
                        *byte = device.read(reg);
                        reg = reg.wrapping_add(1);
                    }
                    index = Some(reg);
                }
            }
        }
        Ok(())
    }
}

pub type TestSensor = Vl53l0x<FakeSensor, NoEnablePin, FakeDelay, Box<dyn Fn() -> u64>>;

/// A driver without enable pin wired to a fresh simulated device.
pub fn setup(config: SensorConfig) -> (TestSensor, FakeSensor, SimClock) {
    let clock = SimClock::default();
    let fake = FakeSensor::new(&clock);
    let mut sensor: TestSensor =
        Vl53l0x::new(fake.clone(), FakeDelay::new(&clock), Box::new(clock.source()));
    sensor.set_config(config).unwrap();
    (sensor, fake, clock)
}

/// Like [`setup`], then activated.
pub fn activated(config: SensorConfig) -> (TestSensor, FakeSensor, SimClock) {
    let (mut sensor, fake, clock) = setup(config);
    sensor.activate().unwrap();
    (sensor, fake, clock)
}
