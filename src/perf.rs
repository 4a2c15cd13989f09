use std::{
    ops::AddAssign,
    time::{Duration, Instant},
};

/// Something that accumulates wall-clock time across calls
pub trait Timeable {
    /// Elapsed time since the last reset
    fn elapsed_time(&self) -> Duration;

    /// Resets the elapsed time to zero
    fn reset_elapsed_time(&mut self);
}

/// Accumulates the duration of timed sections
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Stopwatch {
    elapsed: Duration,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, adds its duration and returns its result along with that duration
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> (T, Duration) {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        *self += elapsed;
        (result, elapsed)
    }
}

impl AddAssign<Duration> for Stopwatch {
    fn add_assign(&mut self, rhs: Duration) {
        self.elapsed += rhs;
    }
}

impl Timeable for Stopwatch {
    fn elapsed_time(&self) -> Duration {
        self.elapsed
    }

    fn reset_elapsed_time(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Stopwatch, Timeable};

    #[test]
    fn test_stopwatch_accumulates_until_reset() {
        let mut watch = Stopwatch::new();
        watch += Duration::from_millis(3);
        let (value, elapsed) = watch.time(|| 40 + 2);
        assert_eq!(value, 42);
        assert_eq!(watch.elapsed_time(), Duration::from_millis(3) + elapsed);

        watch.reset_elapsed_time();
        assert_eq!(watch.elapsed_time(), Duration::ZERO);
    }
}
