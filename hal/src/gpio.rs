//! GPIO (General Purpose Input/Output) abstraction

use core::fmt;

use crate::error::HalResult;
use crate::interrupt::EdgeSinkRef;

/// Physical pin identifier.
///
/// Fixed at board definition time; the numbering follows the SoC datasheet.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(pub u16);

impl PinId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn number(self) -> u16 {
        self.0
    }
}

impl From<u16> for PinId {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO_{}", self.0)
    }
}

/// GPIO pin levels
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Low level (0V)
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }

    /// Returns the opposite level.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Numeric value as printed on the console (0 or 1).
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Interrupt trigger edge
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Rising edge
    Rising,
    /// Falling edge
    Falling,
    /// Both edges
    Both,
}

impl Edge {
    /// Whether a settled transition from `from` to `to` is selected by this policy.
    pub const fn accepts(self, from: Level, to: Level) -> bool {
        match (self, from, to) {
            (_, Level::Low, Level::Low) | (_, Level::High, Level::High) => false,
            (Self::Both, _, _) => true,
            (Self::Rising, Level::Low, Level::High) => true,
            (Self::Falling, Level::High, Level::Low) => true,
            _ => false,
        }
    }
}

/// Pin direction
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// Internal bias resistor selection
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
}

/// Electrical configuration applied to a pin when it is claimed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub direction: Direction,
    pub pull: Pull,
    /// Level driven immediately after configuration (outputs only).
    pub default_level: Level,
}

impl PinConfig {
    pub const fn input(pull: Pull) -> Self {
        Self {
            direction: Direction::Input,
            pull,
            default_level: Level::Low,
        }
    }

    pub const fn output(default_level: Level) -> Self {
        Self {
            direction: Direction::Output,
            pull: Pull::None,
            default_level,
        }
    }

    pub const fn is_input(&self) -> bool {
        matches!(self.direction, Direction::Input)
    }

    pub const fn is_output(&self) -> bool {
        matches!(self.direction, Direction::Output)
    }
}

/// Hardware context owning every physical pin of the board.
///
/// All methods take `&self`: they stand for bounded register accesses and
/// implementations synchronise internally, so one context can be shared by
/// the registry, the dispatcher and the interrupt path.
pub trait GpioHardware: Send + Sync {
    /// Whether the SoC exposes this pin as a GPIO at all.
    fn is_supported(&self, pin: PinId) -> bool;

    /// Apply direction, bias and (for outputs) the initial level.
    fn configure(&self, pin: PinId, config: &PinConfig) -> HalResult<()>;

    /// Read the electrical level; outputs read back the driven level.
    fn read(&self, pin: PinId) -> HalResult<Level>;

    /// Drive an output pin.
    fn write(&self, pin: PinId, level: Level) -> HalResult<()>;

    /// Return the pin to its reset state.
    fn release(&self, pin: PinId) -> HalResult<()>;

    /// Route both-edge interrupts of `pin` into `sink`.
    fn enable_interrupt(&self, pin: PinId, sink: EdgeSinkRef) -> HalResult<()>;

    /// Stop interrupt delivery for `pin`.
    fn disable_interrupt(&self, pin: PinId) -> HalResult<()>;
}
