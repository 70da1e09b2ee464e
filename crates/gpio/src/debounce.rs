//! Per-pin debounce state machine.
//!
//! `IDLE -> DEBOUNCING -> (stable for the interval) -> IDLE`. Every raw edge
//! restarts the interval, so bounce noise is rejected rather than coalesced.
//! When the interval expires the debouncer settles on the last raw level and
//! reports a [`Transition`] only if that level differs from the last settled
//! one.

use gpio_hal::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Debouncing { candidate: Level, since_ms: u64 },
}

/// A settled level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Level,
    pub to: Level,
    /// Time at which the level had been stable for the full interval.
    pub settled_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval_ms: u32,
    stable: Level,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(interval_ms: u32, initial: Level) -> Self {
        Self {
            interval_ms,
            stable: initial,
            state: DebounceState::Idle,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Last settled level.
    pub fn stable(&self) -> Level {
        self.stable
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Records a raw edge and (re)starts the debounce interval.
    pub fn on_edge(&mut self, level: Level, timestamp_ms: u64) {
        // Never move the window backwards when a late sample arrives.
        let since_ms = match self.state {
            DebounceState::Debouncing { since_ms, .. } => timestamp_ms.max(since_ms),
            DebounceState::Idle => timestamp_ms,
        };
        self.state = DebounceState::Debouncing {
            candidate: level,
            since_ms,
        };
    }

    /// Expiry time of the running interval.
    pub fn deadline(&self) -> Option<u64> {
        match self.state {
            DebounceState::Debouncing { since_ms, .. } => {
                Some(since_ms + u64::from(self.interval_ms))
            }
            DebounceState::Idle => None,
        }
    }

    /// Advances the timer to `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<Transition> {
        let DebounceState::Debouncing { candidate, since_ms } = self.state else {
            return None;
        };
        let settled_at_ms = since_ms + u64::from(self.interval_ms);
        if now_ms < settled_at_ms {
            return None;
        }

        self.state = DebounceState::Idle;
        if candidate == self.stable {
            return None;
        }
        let from = self.stable;
        self.stable = candidate;
        Some(Transition {
            from,
            to: candidate,
            settled_at_ms,
        })
    }

    /// Drops a running interval without reporting anything.
    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_after_interval() {
        let mut d = Debouncer::new(100, Level::High);
        d.on_edge(Level::Low, 10);
        assert_eq!(d.deadline(), Some(110));
        assert_eq!(d.poll(109), None);
        assert_eq!(
            d.poll(110),
            Some(Transition {
                from: Level::High,
                to: Level::Low,
                settled_at_ms: 110
            })
        );
        assert_eq!(d.state(), DebounceState::Idle);
        assert_eq!(d.stable(), Level::Low);
    }

    #[test]
    fn bounces_restart_the_interval() {
        let mut d = Debouncer::new(50, Level::High);
        d.on_edge(Level::Low, 0);
        d.on_edge(Level::High, 5);
        d.on_edge(Level::Low, 9);
        d.on_edge(Level::High, 20);
        d.on_edge(Level::Low, 30);
        assert_eq!(d.poll(60), None);
        let t = d.poll(80).unwrap();
        assert_eq!((t.from, t.to, t.settled_at_ms), (Level::High, Level::Low, 80));
        assert_eq!(d.poll(500), None);
    }

    #[test]
    fn glitch_back_to_stable_level_reports_nothing() {
        let mut d = Debouncer::new(20, Level::High);
        d.on_edge(Level::Low, 0);
        d.on_edge(Level::High, 3);
        assert_eq!(d.poll(100), None);
        assert_eq!(d.state(), DebounceState::Idle);
        assert_eq!(d.stable(), Level::High);
    }

    #[test]
    fn cancel_discards_running_interval() {
        let mut d = Debouncer::new(20, Level::Low);
        d.on_edge(Level::High, 0);
        d.cancel();
        assert_eq!(d.deadline(), None);
        assert_eq!(d.poll(100), None);
        assert_eq!(d.stable(), Level::Low);
    }

    #[test]
    fn late_sample_does_not_shorten_window() {
        let mut d = Debouncer::new(10, Level::Low);
        d.on_edge(Level::High, 40);
        d.on_edge(Level::High, 35);
        assert_eq!(d.deadline(), Some(50));
    }
}
