//! Interrupt-side edge buffer.
//!
//! The hardware interrupt path only ever calls [`EdgeQueue::on_edge`], which
//! copies the edge into a fixed-capacity deque inside a critical section.
//! Nothing here allocates or blocks. When the buffer is full the edge is
//! dropped and an overflow flag is raised so the dispatcher can resample the
//! affected pins on its next poll.

use core::cell::RefCell;

use critical_section::Mutex;
use gpio_hal::{EdgeSink, Level, PinId};
use heapless::Deque;

/// Number of raw edges buffered between two polls.
pub const EDGE_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEdge {
    pub pin: PinId,
    pub level: Level,
    pub timestamp_ms: u64,
}

struct EdgeBuffer {
    edges: Deque<RawEdge, EDGE_QUEUE_DEPTH>,
    overflowed: bool,
    overflow_count: u32,
}

pub struct EdgeQueue {
    inner: Mutex<RefCell<EdgeBuffer>>,
}

impl EdgeQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(EdgeBuffer {
                edges: Deque::new(),
                overflowed: false,
                overflow_count: 0,
            })),
        }
    }

    /// Buffers an edge; returns `false` if it had to be dropped.
    pub fn push(&self, edge: RawEdge) -> bool {
        critical_section::with(|cs| {
            let mut buf = self.inner.borrow_ref_mut(cs);
            if buf.edges.push_back(edge).is_ok() {
                true
            } else {
                buf.overflowed = true;
                buf.overflow_count = buf.overflow_count.saturating_add(1);
                false
            }
        })
    }

    /// Moves every buffered edge into `out`, oldest first.
    ///
    /// Returns whether edges were lost since the previous drain.
    pub fn drain_into(&self, out: &mut Vec<RawEdge>) -> bool {
        out.reserve(EDGE_QUEUE_DEPTH);
        critical_section::with(|cs| {
            let mut buf = self.inner.borrow_ref_mut(cs);
            while let Some(edge) = buf.edges.pop_front() {
                out.push(edge);
            }
            core::mem::replace(&mut buf.overflowed, false)
        })
    }

    /// Drops every buffered edge of `pin`, keeping the others in order.
    /// Returns how many were dropped.
    pub fn discard_pin(&self, pin: PinId) -> usize {
        critical_section::with(|cs| {
            let mut buf = self.inner.borrow_ref_mut(cs);
            let mut discarded = 0;
            for _ in 0..buf.edges.len() {
                let Some(edge) = buf.edges.pop_front() else {
                    break;
                };
                if edge.pin == pin {
                    discarded += 1;
                } else {
                    // Cannot fail: an edge was just popped.
                    let _ = buf.edges.push_back(edge);
                }
            }
            discarded
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).edges.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of edges dropped because the buffer was full.
    pub fn overflow_count(&self) -> u32 {
        critical_section::with(|cs| self.inner.borrow_ref(cs).overflow_count)
    }
}

impl Default for EdgeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeSink for EdgeQueue {
    fn on_edge(&self, pin: PinId, level: Level, timestamp_ms: u64) {
        self.push(RawEdge {
            pin,
            level,
            timestamp_ms,
        });
    }
}
