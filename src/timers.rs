//! Named cumulative timers for solver diagnostics.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates wall-clock time against named sections.  Used by the
/// solver when the `time` diagnostic flag is set.
#[derive(Debug, Default)]
pub struct Timers {
    sections: HashMap<&'static str, Duration>,
    order: Vec<&'static str>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time a closure against the named section.
    pub fn time<R>(&mut self, key: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();
        if !self.sections.contains_key(key) {
            self.order.push(key);
        }
        *self.sections.entry(key).or_default() += elapsed;
        out
    }

    pub fn elapsed(&self, key: &'static str) -> Duration {
        self.sections.get(key).copied().unwrap_or(Duration::ZERO)
    }

    /// Print all section totals in first-use order.
    pub fn print(&self) {
        for key in &self.order {
            println!("{}: {:?}", key, self.sections[key]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation() {
        let mut timers = Timers::new();
        let x = timers.time("work", || 21 * 2);
        assert_eq!(x, 42);
        timers.time("work", || ());
        assert!(timers.elapsed("work") >= Duration::ZERO);
        assert_eq!(timers.elapsed("missing"), Duration::ZERO);
    }
}
