//! Request flags.
//!
//! A request combines exactly one direction with optional pull and
//! default-level modifiers, e.g. `PinFlags::OUTPUT | PinFlags::DEFAULT_HIGH`.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use gpio_hal::{Direction, Level, PinConfig, Pull};

use crate::error::{GpioError, GpioResult};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinFlags(u32);

impl PinFlags {
    pub const INPUT: Self = Self(1 << 0);
    pub const OUTPUT: Self = Self(1 << 1);
    pub const PULL_UP: Self = Self(1 << 2);
    pub const PULL_DOWN: Self = Self(1 << 3);
    pub const DEFAULT_HIGH: Self = Self(1 << 4);
    pub const DEFAULT_LOW: Self = Self(1 << 5);

    const KNOWN: u32 = 0x3f;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wraps raw bits without validation; checked in [`PinFlags::to_config`].
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Resolves the flags into an electrical configuration.
    pub fn to_config(self) -> GpioResult<PinConfig> {
        let invalid = |reason| GpioError::InvalidFlags {
            bits: self.0,
            reason,
        };

        if self.0 & !Self::KNOWN != 0 {
            return Err(invalid("unknown flag bits"));
        }

        let direction = match (self.contains(Self::INPUT), self.contains(Self::OUTPUT)) {
            (true, false) => Direction::Input,
            (false, true) => Direction::Output,
            (true, true) => return Err(invalid("both input and output requested")),
            (false, false) => return Err(invalid("no direction requested")),
        };

        let pull = match (self.contains(Self::PULL_UP), self.contains(Self::PULL_DOWN)) {
            (false, false) => Pull::None,
            (true, false) => Pull::Up,
            (false, true) => Pull::Down,
            (true, true) => return Err(invalid("both pull-up and pull-down requested")),
        };

        let default_level = match (
            self.contains(Self::DEFAULT_HIGH),
            self.contains(Self::DEFAULT_LOW),
        ) {
            (true, true) => return Err(invalid("both default levels requested")),
            (true, false) => Level::High,
            _ => Level::Low,
        };

        Ok(PinConfig {
            direction,
            pull,
            default_level,
        })
    }
}

impl BitOr for PinFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PinFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PinFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PinFlags, &str); 6] = [
            (PinFlags::INPUT, "INPUT"),
            (PinFlags::OUTPUT, "OUTPUT"),
            (PinFlags::PULL_UP, "PULLUP"),
            (PinFlags::PULL_DOWN, "PULLDOWN"),
            (PinFlags::DEFAULT_HIGH, "DEFHIGH"),
            (PinFlags::DEFAULT_LOW, "DEFLOW"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("NONE")?;
        }
        Ok(())
    }
}
