//! Pin registry.
//!
//! Maps physical pins to opaque [`PinHandle`]s and owns the configuration
//! each pin was claimed with. A pin has at most one active claim: asking for
//! a pin that is already claimed fails with [`GpioError::PinClaimed`] until
//! the holder releases it, for every pin and every flag combination.
//!
//! Handles come from a monotonically increasing counter and are never
//! reused, so a released handle stays invalid even after its pin is claimed
//! again.

use core::fmt;
use core::num::NonZeroU32;
use std::collections::BTreeMap;
use std::sync::Arc;

use gpio_hal::{Direction, GpioHardware, Level, PinConfig, PinId};
use log::{debug, trace, warn};

use crate::config::GpioConfig;
use crate::dispatcher::TriggerSlot;
use crate::error::{GpioError, GpioResult};
use crate::flags::PinFlags;
use crate::sync::Mutex;

/// Opaque, non-zero token for a claimed pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinHandle(NonZeroU32);

impl PinHandle {
    /// Rebuilds a handle from its raw token; the zero token has no handle.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    pub const fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for PinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct PinEntry {
    pub(crate) pin: PinId,
    pub(crate) config: PinConfig,
    pub(crate) trigger: Option<TriggerSlot>,
}

pub(crate) struct HandleTable {
    entries: BTreeMap<PinHandle, PinEntry>,
    by_pin: BTreeMap<PinId, PinHandle>,
    next_raw: u32,
}

impl HandleTable {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_pin: BTreeMap::new(),
            next_raw: 1,
        }
    }

    pub(crate) fn entry(&self, handle: PinHandle) -> GpioResult<&PinEntry> {
        self.entries
            .get(&handle)
            .ok_or(GpioError::InvalidHandle(handle))
    }

    pub(crate) fn entry_mut(&mut self, handle: PinHandle) -> GpioResult<&mut PinEntry> {
        self.entries
            .get_mut(&handle)
            .ok_or(GpioError::InvalidHandle(handle))
    }

    pub(crate) fn by_pin_mut(&mut self, pin: PinId) -> Option<(PinHandle, &mut PinEntry)> {
        let handle = *self.by_pin.get(&pin)?;
        self.entries.get_mut(&handle).map(|entry| (handle, entry))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (PinHandle, &PinEntry)> {
        self.entries.iter().map(|(h, e)| (*h, e))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (PinHandle, &mut PinEntry)> {
        self.entries.iter_mut().map(|(h, e)| (*h, e))
    }

    fn insert(&mut self, pin: PinId, config: PinConfig, capacity: usize) -> GpioResult<PinHandle> {
        if self.entries.len() >= capacity {
            return Err(GpioError::TableFull(capacity));
        }
        let handle = PinHandle::from_raw(self.next_raw).ok_or(GpioError::TableFull(capacity))?;
        self.next_raw = self.next_raw.checked_add(1).unwrap_or(0);
        self.entries.insert(
            handle,
            PinEntry {
                pin,
                config,
                trigger: None,
            },
        );
        self.by_pin.insert(pin, handle);
        Ok(handle)
    }

    fn remove(&mut self, handle: PinHandle) -> GpioResult<PinEntry> {
        let entry = self
            .entries
            .remove(&handle)
            .ok_or(GpioError::InvalidHandle(handle))?;
        self.by_pin.remove(&entry.pin);
        Ok(entry)
    }
}

/// Handle table on top of an injected hardware context.
///
/// Every operation takes the table lock for its whole duration, so claims,
/// releases and the dispatcher's debounce bookkeeping never interleave.
pub struct PinRegistry<H: GpioHardware> {
    hw: Arc<H>,
    config: GpioConfig,
    table: Mutex<HandleTable>,
}

impl<H: GpioHardware> PinRegistry<H> {
    pub fn new(hw: Arc<H>, config: GpioConfig) -> Self {
        Self {
            hw,
            config,
            table: Mutex::new(HandleTable::new()),
        }
    }

    pub fn hardware(&self) -> &Arc<H> {
        &self.hw
    }

    pub fn config(&self) -> &GpioConfig {
        &self.config
    }

    /// Claims `pin` with the configuration described by `flags`.
    ///
    /// On success the pin is configured and (for outputs) already driving its
    /// default level.
    pub fn request(&self, pin: PinId, flags: PinFlags) -> GpioResult<PinHandle> {
        let config = flags.to_config()?;
        if !self.hw.is_supported(pin) {
            warn!("{pin} request rejected: not supported");
            return Err(GpioError::UnsupportedPin(pin));
        }

        let mut table = self.table.lock();
        if let Some(&holder) = table.by_pin.get(&pin) {
            warn!("{pin} request rejected: held by handle {holder}");
            return Err(GpioError::PinClaimed { pin, holder });
        }
        if table.entries.len() >= self.config.max_handles {
            return Err(GpioError::TableFull(self.config.max_handles));
        }

        self.hw.configure(pin, &config).map_err(|err| {
            warn!("{pin} configure failed: {err}");
            GpioError::Hardware(err)
        })?;

        let handle = table.insert(pin, config, self.config.max_handles)?;
        debug!("{pin} claimed as handle {handle} ({flags})");
        Ok(handle)
    }

    /// Current level of the pin; outputs read back their driven level.
    pub fn read(&self, handle: PinHandle) -> GpioResult<Level> {
        let table = self.table.lock();
        let entry = table.entry(handle)?;
        Ok(self.hw.read(entry.pin)?)
    }

    /// Drives an output handle. Input handles are rejected.
    pub fn write(&self, handle: PinHandle, level: Level) -> GpioResult<()> {
        let table = self.table.lock();
        let entry = table.entry(handle)?;
        Self::require_output(handle, entry)?;
        self.hw.write(entry.pin, level)?;
        trace!("{} <- {}", entry.pin, level);
        Ok(())
    }

    /// Inverts an output handle's level and returns the new level.
    pub fn toggle(&self, handle: PinHandle) -> GpioResult<Level> {
        let table = self.table.lock();
        let entry = table.entry(handle)?;
        Self::require_output(handle, entry)?;
        let next = self.hw.read(entry.pin)?.toggled();
        self.hw.write(entry.pin, next)?;
        trace!("{} <- {}", entry.pin, next);
        Ok(next)
    }

    /// Returns the pin to the unclaimed pool.
    ///
    /// The handle is invalid as soon as this returns, even when the hardware
    /// reports an error while resetting the pin. Any trigger on the handle is
    /// dropped together with its in-flight debounce.
    pub fn release(&self, handle: PinHandle) -> GpioResult<()> {
        let mut table = self.table.lock();
        let entry = table.remove(handle)?;
        if entry.trigger.is_some() {
            if let Err(err) = self.hw.disable_interrupt(entry.pin) {
                warn!("{} interrupt disable failed: {err}", entry.pin);
            }
        }
        self.hw.release(entry.pin)?;
        debug!("{} released (handle {handle})", entry.pin);
        Ok(())
    }

    pub fn pin_id(&self, handle: PinHandle) -> GpioResult<PinId> {
        Ok(self.table.lock().entry(handle)?.pin)
    }

    pub fn pin_config(&self, handle: PinHandle) -> GpioResult<PinConfig> {
        Ok(self.table.lock().entry(handle)?.config)
    }

    pub fn is_valid(&self, handle: PinHandle) -> bool {
        self.table.lock().entry(handle).is_ok()
    }

    /// Handle currently holding `pin`, if any.
    pub fn handle_for(&self, pin: PinId) -> Option<PinHandle> {
        self.table.lock().by_pin.get(&pin).copied()
    }

    pub fn claimed_count(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// Runs `f` with exclusive access to the handle table.
    pub(crate) fn with_table<R>(&self, f: impl FnOnce(&mut HandleTable, &H) -> R) -> R {
        let mut table = self.table.lock();
        f(&mut table, &self.hw)
    }

    fn require_output(handle: PinHandle, entry: &PinEntry) -> GpioResult<()> {
        match entry.config.direction {
            Direction::Output => Ok(()),
            actual => Err(GpioError::WrongDirection { handle, actual }),
        }
    }
}
