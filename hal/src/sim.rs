//! Virtual-time simulated board.
//!
//! [`SimBoard`] stands in for the SoC in hosted builds. Time only moves when
//! somebody calls [`Clock::sleep_until`] or [`SimBoard::advance_to`]; scripted
//! stimuli scheduled with [`SimBoard::schedule`] fire at their exact virtual
//! timestamps while time advances, which makes debounce timing reproducible
//! in tests.

use std::collections::BTreeMap;
use std::vec::Vec;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::{HalError, HalResult};
use crate::gpio::{GpioHardware, Level, PinConfig, PinId, Pull};
use crate::interrupt::EdgeSinkRef;

/// A scripted change of the external drive on one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    pub at_ms: u64,
    pub pin: PinId,
    /// `None` lets the pin float back to its pull.
    pub drive: Option<Level>,
}

#[derive(Default)]
struct SimPin {
    config: Option<PinConfig>,
    output: Option<Level>,
    drive: Option<Level>,
    sink: Option<EdgeSinkRef>,
    writes: Vec<(u64, Level)>,
    fault: bool,
}

impl SimPin {
    fn level(&self) -> Level {
        match self.config {
            Some(cfg) if cfg.is_output() => self.output.unwrap_or(cfg.default_level),
            Some(cfg) => self.drive.unwrap_or(match cfg.pull {
                Pull::Up => Level::High,
                Pull::Down | Pull::None => Level::Low,
            }),
            None => self.drive.unwrap_or(Level::Low),
        }
    }
}

#[derive(Default)]
struct BoardState {
    now_ms: u64,
    pins: BTreeMap<PinId, SimPin>,
    script: Vec<Stimulus>,
}

/// Simulated GPIO bank with a virtual millisecond clock.
#[derive(Default)]
pub struct SimBoard {
    state: Mutex<BoardState>,
}

impl SimBoard {
    /// Creates a board exposing exactly the given pins.
    pub fn new<I>(pins: I) -> Self
    where
        I: IntoIterator<Item = PinId>,
    {
        let pins = pins.into_iter().map(|p| (p, SimPin::default())).collect();
        Self {
            state: Mutex::new(BoardState {
                pins,
                ..BoardState::default()
            }),
        }
    }

    /// Creates a board exposing pins `0..count`.
    pub fn with_pin_count(count: u16) -> Self {
        Self::new((0..count).map(PinId))
    }

    /// Drive an input pin externally, raising an edge if its level changes.
    pub fn drive(&self, pin: PinId, level: Level) -> HalResult<()> {
        self.set_drive(pin, Some(level))
    }

    /// Remove the external drive so the pin follows its pull again.
    pub fn release_drive(&self, pin: PinId) -> HalResult<()> {
        self.set_drive(pin, None)
    }

    /// Queue a drive change to happen when virtual time reaches `at_ms`.
    ///
    /// Stimuli with equal timestamps fire in the order they were scheduled.
    pub fn schedule(&self, at_ms: u64, pin: PinId, drive: Option<Level>) {
        let mut state = self.state.lock();
        let idx = state.script.partition_point(|s| s.at_ms <= at_ms);
        state.script.insert(idx, Stimulus { at_ms, pin, drive });
    }

    /// Ground `pin` at `at_ms` and let it float again after `hold_ms`.
    pub fn schedule_press(&self, pin: PinId, at_ms: u64, hold_ms: u64) {
        self.schedule(at_ms, pin, Some(Level::Low));
        self.schedule(at_ms + hold_ms, pin, None);
    }

    /// Number of scripted stimuli that have not fired yet.
    pub fn pending_stimuli(&self) -> usize {
        self.state.lock().script.len()
    }

    /// Move virtual time forward, firing every stimulus due on the way.
    pub fn advance_to(&self, deadline_ms: u64) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.script.first() {
                    Some(s) if s.at_ms <= deadline_ms => {
                        let stimulus = state.script.remove(0);
                        state.now_ms = state.now_ms.max(stimulus.at_ms);
                        Some(stimulus)
                    }
                    _ => {
                        state.now_ms = state.now_ms.max(deadline_ms);
                        None
                    }
                }
            };
            match next {
                // Unknown pins in the script are ignored.
                Some(s) => {
                    let _ = self.set_drive(s.pin, s.drive);
                }
                None => break,
            }
        }
    }

    pub fn advance_by(&self, delta_ms: u64) {
        let deadline = self.now_ms() + delta_ms;
        self.advance_to(deadline);
    }

    /// Make the next `configure` of `pin` fail as if the pad were unavailable.
    pub fn inject_fault(&self, pin: PinId) {
        if let Some(p) = self.state.lock().pins.get_mut(&pin) {
            p.fault = true;
        }
    }

    /// Timestamped history of levels driven on an output pin.
    pub fn write_log(&self, pin: PinId) -> Vec<(u64, Level)> {
        self.state
            .lock()
            .pins
            .get(&pin)
            .map(|p| p.writes.clone())
            .unwrap_or_default()
    }

    pub fn pin_config(&self, pin: PinId) -> Option<PinConfig> {
        self.state.lock().pins.get(&pin).and_then(|p| p.config)
    }

    pub fn interrupt_enabled(&self, pin: PinId) -> bool {
        self.state
            .lock()
            .pins
            .get(&pin)
            .is_some_and(|p| p.sink.is_some())
    }

    fn set_drive(&self, pin: PinId, drive: Option<Level>) -> HalResult<()> {
        let notify = {
            let mut state = self.state.lock();
            let now = state.now_ms;
            let p = state.pins.get_mut(&pin).ok_or(HalError::InvalidParameter)?;
            let before = p.level();
            p.drive = drive;
            let after = p.level();
            let is_input = p.config.is_some_and(|c| c.is_input());
            match &p.sink {
                Some(sink) if is_input && before != after => Some((sink.clone(), after, now)),
                _ => None,
            }
        };
        // Sink runs without the board lock held.
        if let Some((sink, level, now)) = notify {
            sink.on_edge(pin, level, now);
        }
        Ok(())
    }
}

impl GpioHardware for SimBoard {
    fn is_supported(&self, pin: PinId) -> bool {
        self.state.lock().pins.contains_key(&pin)
    }

    fn configure(&self, pin: PinId, config: &PinConfig) -> HalResult<()> {
        let mut state = self.state.lock();
        let now = state.now_ms;
        let p = state.pins.get_mut(&pin).ok_or(HalError::NotSupported)?;
        if p.fault {
            p.fault = false;
            return Err(HalError::Busy);
        }
        p.config = Some(*config);
        p.sink = None;
        if config.is_output() {
            p.output = Some(config.default_level);
            p.writes.push((now, config.default_level));
        } else {
            p.output = None;
        }
        Ok(())
    }

    fn read(&self, pin: PinId) -> HalResult<Level> {
        let state = self.state.lock();
        let p = state.pins.get(&pin).ok_or(HalError::NotSupported)?;
        if p.config.is_none() {
            return Err(HalError::ConfigurationError);
        }
        Ok(p.level())
    }

    fn write(&self, pin: PinId, level: Level) -> HalResult<()> {
        let mut state = self.state.lock();
        let now = state.now_ms;
        let p = state.pins.get_mut(&pin).ok_or(HalError::NotSupported)?;
        match p.config {
            Some(cfg) if cfg.is_output() => {
                p.output = Some(level);
                p.writes.push((now, level));
                Ok(())
            }
            _ => Err(HalError::ConfigurationError),
        }
    }

    fn release(&self, pin: PinId) -> HalResult<()> {
        let mut state = self.state.lock();
        let p = state.pins.get_mut(&pin).ok_or(HalError::NotSupported)?;
        p.config = None;
        p.output = None;
        p.sink = None;
        Ok(())
    }

    fn enable_interrupt(&self, pin: PinId, sink: EdgeSinkRef) -> HalResult<()> {
        let mut state = self.state.lock();
        let p = state.pins.get_mut(&pin).ok_or(HalError::NotSupported)?;
        match p.config {
            Some(cfg) if cfg.is_input() => {
                p.sink = Some(sink);
                Ok(())
            }
            _ => Err(HalError::ConfigurationError),
        }
    }

    fn disable_interrupt(&self, pin: PinId) -> HalResult<()> {
        let mut state = self.state.lock();
        let p = state.pins.get_mut(&pin).ok_or(HalError::NotSupported)?;
        p.sink = None;
        Ok(())
    }
}

impl Clock for SimBoard {
    fn now_ms(&self) -> u64 {
        self.state.lock().now_ms
    }

    fn sleep_until(&self, deadline_ms: u64) {
        self.advance_to(deadline_ms);
    }
}
