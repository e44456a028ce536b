/// A monotonic time source with millisecond precision.
///
/// The driver uses it to bound waits, to timestamp measurements and to pace the
/// polling scheduler. Anything that can produce "milliseconds since some fixed
/// point" works, including a plain closure:
///
/// ```rust
/// use vl53l0x_ranging::Clock;
///
/// let boot = std::time::Instant::now();
/// let clock = move || boot.elapsed().as_millis() as u64;
/// assert!(clock.now_ms() <= clock.now_ms());
/// ```
///
/// Waits are also capped at one poll per millisecond of their timeout, so a
/// clock that stalls cannot hang the driver, but timestamps and the polling
/// scheduler still need a clock that advances.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed epoch.
    fn now_ms(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    fn now_ms(&self) -> u64 {
        self()
    }
}
