//! Edge-trigger dispatcher.
//!
//! Turns raw, possibly noisy transitions on input handles into single
//! debounced notifications delivered on the application's dispatch context.
//!
//! The work is split over three stages:
//!
//! 1. the interrupt path records edges in the [`EdgeQueue`];
//! 2. [`TriggerDispatcher::poll`] (the debounce timer service) feeds those
//!    edges into each handle's [`Debouncer`] and queues a [`Notification`]
//!    for every settled transition the edge policy selects;
//! 3. [`TriggerDispatcher::dispatch_once`] / [`TriggerDispatcher::run_until_idle`]
//!    pop notifications and invoke callbacks with no lock held.
//!
//! Notifications for one handle are delivered in the order their transitions
//! settled. A notification whose registration was disabled, or whose handle
//! was released, before delivery is discarded.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use gpio_hal::{Direction, Edge, EdgeSinkRef, GpioHardware, Level, PinId};
use log::{debug, trace, warn};

use crate::debounce::Debouncer;
use crate::edge_queue::EdgeQueue;
use crate::error::{GpioError, GpioResult};
use crate::registry::{PinHandle, PinRegistry};
use crate::sync::Mutex;

/// Application callback: `(handle, pin, settled level)`.
pub type TriggerCallback = Arc<dyn Fn(PinHandle, PinId, Level) + Send + Sync>;

/// Trigger registration stored alongside its handle in the registry table.
pub(crate) struct TriggerSlot {
    pub(crate) registration: u32,
    pub(crate) edge: Edge,
    pub(crate) debouncer: Debouncer,
    pub(crate) callback: TriggerCallback,
}

/// A debounced level change waiting for the dispatch context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub handle: PinHandle,
    pub pin: PinId,
    pub level: Level,
    pub settled_at_ms: u64,
    registration: u32,
}

/// Counters describing dispatcher activity since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Raw edges drained from the interrupt buffer.
    pub edges_seen: u64,
    /// Raw edges on pins without a trigger.
    pub edges_ignored: u64,
    /// Times the interrupt buffer overflowed and pins were resampled.
    pub edge_overflows: u64,
    /// Settled transitions rejected by the edge policy.
    pub transitions_filtered: u64,
    pub notifications_queued: u64,
    /// Notifications lost because the dispatch queue was full.
    pub notifications_dropped: u64,
    /// Notifications discarded after a disable or release.
    pub notifications_stale: u64,
    pub notifications_delivered: u64,
}

pub struct TriggerDispatcher<H: GpioHardware> {
    registry: Arc<PinRegistry<H>>,
    edges: Arc<EdgeQueue>,
    pending: Mutex<VecDeque<Notification>>,
    stats: Mutex<DispatchStats>,
    next_registration: AtomicU32,
}

impl<H: GpioHardware> TriggerDispatcher<H> {
    pub fn new(registry: Arc<PinRegistry<H>>) -> Self {
        let depth = registry.config().dispatch_queue_depth;
        Self {
            registry,
            edges: Arc::new(EdgeQueue::new()),
            pending: Mutex::new(VecDeque::with_capacity(depth)),
            stats: Mutex::new(DispatchStats::default()),
            next_registration: AtomicU32::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<PinRegistry<H>> {
        &self.registry
    }

    /// The sink handed to the hardware for every triggered pin.
    pub fn edge_sink(&self) -> EdgeSinkRef {
        self.edges.clone()
    }

    /// Registers `callback` for debounced transitions of an input handle.
    ///
    /// Only one registration per handle is allowed; a second call without an
    /// intervening [`trigger_disable`](Self::trigger_disable) is rejected
    /// with [`GpioError::DuplicateRegistration`].
    pub fn trigger_enable<F>(
        &self,
        handle: PinHandle,
        callback: F,
        debounce_ms: u32,
        edge: Edge,
    ) -> GpioResult<()>
    where
        F: Fn(PinHandle, PinId, Level) + Send + Sync + 'static,
    {
        let limit = self.registry.config().max_debounce_ms;
        if debounce_ms > limit {
            return Err(GpioError::DebounceTooLong {
                requested: debounce_ms,
                limit,
            });
        }

        let sink = self.edge_sink();
        let registration = self.next_registration.fetch_add(1, Ordering::Relaxed);
        self.registry.with_table(|table, hw| {
            let entry = table.entry_mut(handle)?;
            if entry.config.direction != Direction::Input {
                return Err(GpioError::WrongDirection {
                    handle,
                    actual: entry.config.direction,
                });
            }
            if entry.trigger.is_some() {
                return Err(GpioError::DuplicateRegistration(handle));
            }

            let initial = hw.read(entry.pin)?;
            let stale = self.edges.discard_pin(entry.pin);
            if stale > 0 {
                debug!("{} {stale} buffered edges from an earlier trigger dropped", entry.pin);
            }
            hw.enable_interrupt(entry.pin, sink)?;
            entry.trigger = Some(TriggerSlot {
                registration,
                edge,
                debouncer: Debouncer::new(debounce_ms, initial),
                callback: Arc::new(callback),
            });
            debug!(
                "{} trigger enabled on handle {handle}: {edge:?}, {debounce_ms} ms, level {initial}",
                entry.pin
            );
            Ok(())
        })
    }

    /// Removes the registration of `handle`.
    ///
    /// An in-flight debounce is discarded and notifications already queued
    /// for the registration are dropped; no callback runs for them.
    pub fn trigger_disable(&self, handle: PinHandle) -> GpioResult<()> {
        let registration = self.registry.with_table(|table, hw| -> GpioResult<u32> {
            let entry = table.entry_mut(handle)?;
            let slot = entry
                .trigger
                .take()
                .ok_or(GpioError::NotRegistered(handle))?;
            if let Err(err) = hw.disable_interrupt(entry.pin) {
                warn!("{} interrupt disable failed: {err}", entry.pin);
            }
            self.edges.discard_pin(entry.pin);
            if slot.debouncer.deadline().is_some() {
                debug!("{} in-flight debounce discarded", entry.pin);
            }
            debug!("{} trigger disabled on handle {handle}", entry.pin);
            Ok(slot.registration)
        })?;

        let purged = {
            let mut pending = self.pending.lock();
            let before = pending.len();
            pending.retain(|n| n.registration != registration);
            before - pending.len()
        };
        if purged > 0 {
            self.stats.lock().notifications_stale += purged as u64;
        }
        Ok(())
    }

    pub fn is_registered(&self, handle: PinHandle) -> bool {
        self.registry.with_table(|table, _| {
            table
                .entry(handle)
                .map(|e| e.trigger.is_some())
                .unwrap_or(false)
        })
    }

    /// Debounce timer service.
    ///
    /// Replays buffered raw edges into the debouncers in arrival order,
    /// settling any interval that expired before each edge, then settles
    /// every interval that has expired at `now_ms` and queues the resulting
    /// notifications. Returns the number of notifications queued.
    pub fn poll(&self, now_ms: u64) -> usize {
        let mut raw = Vec::new();
        let mut batch = PollBatch::default();

        let overflowed = self.registry.with_table(|table, hw| {
            // Drained under the table lock: an edge never reaches a
            // registration armed after it was recorded.
            let overflowed = self.edges.drain_into(&mut raw);

            for edge in &raw {
                let Some((handle, entry)) = table.by_pin_mut(edge.pin) else {
                    batch.ignored += 1;
                    continue;
                };
                let pin = entry.pin;
                let Some(slot) = entry.trigger.as_mut() else {
                    batch.ignored += 1;
                    continue;
                };
                batch.settle(handle, pin, slot, edge.timestamp_ms);
                slot.debouncer.on_edge(edge.level, edge.timestamp_ms);
            }

            if overflowed {
                warn!("edge buffer overflowed, resampling triggered pins");
                for (handle, entry) in table.iter_mut() {
                    let pin = entry.pin;
                    let Some(slot) = entry.trigger.as_mut() else {
                        continue;
                    };
                    batch.settle(handle, pin, slot, now_ms);
                    match hw.read(pin) {
                        Ok(level) => slot.debouncer.on_edge(level, now_ms),
                        Err(err) => warn!("{pin} resample failed: {err}"),
                    }
                }
            }

            for (handle, entry) in table.iter_mut() {
                let pin = entry.pin;
                if let Some(slot) = entry.trigger.as_mut() {
                    batch.settle(handle, pin, slot, now_ms);
                }
            }
            overflowed
        });

        let PollBatch {
            mut fired,
            ignored,
            filtered,
        } = batch;
        fired.sort_by_key(|n| n.settled_at_ms);

        let depth = self.registry.config().dispatch_queue_depth;
        let mut queued = 0usize;
        let mut dropped = 0u64;
        {
            let mut pending = self.pending.lock();
            for notification in fired {
                if pending.len() >= depth {
                    warn!(
                        "dispatch queue full, dropping {} level {} notification",
                        notification.pin, notification.level
                    );
                    dropped += 1;
                } else {
                    pending.push_back(notification);
                    queued += 1;
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.edges_seen += raw.len() as u64;
        stats.edges_ignored += ignored;
        stats.edge_overflows += u64::from(overflowed);
        stats.transitions_filtered += filtered;
        stats.notifications_queued += queued as u64;
        stats.notifications_dropped += dropped;
        queued
    }

    /// Earliest running debounce expiry as of the last [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<u64> {
        self.registry.with_table(|table, _| {
            table
                .iter()
                .filter_map(|(_, e)| e.trigger.as_ref())
                .filter_map(|slot| slot.debouncer.deadline())
                .min()
        })
    }

    /// Whether raw edges are buffered that no poll has consumed yet.
    pub fn has_raw_edges(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Snapshot of the queued notifications in delivery order.
    pub fn pending_notifications(&self) -> Vec<Notification> {
        self.pending.lock().iter().copied().collect()
    }

    /// Delivers one queued notification. Returns `false` when the queue is empty.
    pub fn dispatch_once(&self) -> bool {
        let Some(notification) = self.pending.lock().pop_front() else {
            return false;
        };

        let callback = self.registry.with_table(|table, _| {
            table
                .entry(notification.handle)
                .ok()
                .and_then(|e| e.trigger.as_ref())
                .filter(|slot| slot.registration == notification.registration)
                .map(|slot| slot.callback.clone())
        });

        match callback {
            Some(callback) => {
                callback(notification.handle, notification.pin, notification.level);
                self.stats.lock().notifications_delivered += 1;
            }
            None => {
                debug!(
                    "{} notification discarded, handle {} no longer registered",
                    notification.pin, notification.handle
                );
                self.stats.lock().notifications_stale += 1;
            }
        }
        true
    }

    /// Delivers every queued notification, returning how many were handled.
    pub fn run_until_idle(&self) -> usize {
        let mut handled = 0;
        while self.dispatch_once() {
            handled += 1;
        }
        handled
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.lock()
    }
}

/// Transitions settled during one [`TriggerDispatcher::poll`].
#[derive(Default)]
struct PollBatch {
    fired: Vec<Notification>,
    ignored: u64,
    filtered: u64,
}

impl PollBatch {
    /// Advances the debouncer of `slot` to `at_ms` and keeps the settled
    /// transition if the edge policy selects it.
    fn settle(&mut self, handle: PinHandle, pin: PinId, slot: &mut TriggerSlot, at_ms: u64) {
        let Some(transition) = slot.debouncer.poll(at_ms) else {
            return;
        };
        if slot.edge.accepts(transition.from, transition.to) {
            trace!("{pin} settled {} -> {}", transition.from, transition.to);
            self.fired.push(Notification {
                handle,
                pin,
                level: transition.to,
                settled_at_ms: transition.settled_at_ms,
                registration: slot.registration,
            });
        } else {
            trace!("{pin} transition filtered by {:?} policy", slot.edge);
            self.filtered += 1;
        }
    }
}
