//! Unsolicited result codes.
//!
//! System, SIM, network and call lifecycle events reported by the modem.
//! The runtime only transports them; interpreting them is up to the
//! application's handler.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Modem finished booting far enough to send and receive SMS.
    SmsReady,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    NotInserted,
    Ready,
    PinRequired,
    PukRequired,
    NotReady,
    Error(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Busy,
    NoAnswer,
    NoCarrier,
    NoDialTone,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FotaStatus {
    Started,
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrcEvent {
    SystemState(SystemState),
    SimCard(SimState),
    GsmNetwork(u32),
    GprsNetwork(u32),
    FunctionMode(u32),
    IncomingCall { number: String },
    CallState(CallState),
    NewSms { index: u32 },
    ModuleVoltage { millivolts: u32 },
    AlarmRing,
    FileDownload { status: u32 },
    Fota(FotaStatus),
    StkProactive,
}

/// Default handler: logs the events an application usually cares about.
pub fn log_urc(event: &UrcEvent) {
    match event {
        UrcEvent::SimCard(state) => match state {
            SimState::NotInserted => warn!("SYSTEM: SIM card not inserted!"),
            SimState::Ready => info!("SYSTEM: SIM card Ready!"),
            SimState::PinRequired => warn!("SYSTEM: SIM PIN required!"),
            SimState::PukRequired => warn!("SYSTEM: SIM PUK required!"),
            SimState::NotReady => warn!("SYSTEM: SIM card not recognized!"),
            SimState::Error(code) => warn!("SYSTEM: SIM ERROR: {code}"),
        },
        UrcEvent::GsmNetwork(state) => info!("SYSTEM: GSM NW State: {state}"),
        UrcEvent::IncomingCall { number } => info!("Incoming voice call from: {number}"),
        UrcEvent::CallState(state) => match state {
            CallState::Busy => info!("The number you dialed is busy now"),
            CallState::NoAnswer => info!("The number you dialed has no answer"),
            CallState::NoCarrier => info!("The number you dialed cannot reach"),
            CallState::NoDialTone => info!("No Dial tone"),
            CallState::Other(_) => {}
        },
        UrcEvent::NewSms { index } => info!("SMS: New SMS ({index})"),
        UrcEvent::ModuleVoltage { millivolts } => info!("VBatt Voltage: {millivolts}"),
        UrcEvent::Fota(FotaStatus::Failed) => warn!("FOTA: update failed"),
        _ => {}
    }
}

pub(crate) struct UrcQueue {
    events: Mutex<VecDeque<UrcEvent>>,
    depth: usize,
}

impl UrcQueue {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(depth)),
            depth,
        }
    }

    pub(crate) fn push(&self, event: UrcEvent) -> Result<(), RuntimeError> {
        let mut events = self.events.lock();
        if events.len() >= self.depth {
            return Err(RuntimeError::UrcQueueFull(self.depth));
        }
        events.push_back(event);
        Ok(())
    }

    pub(crate) fn pop(&self) -> Option<UrcEvent> {
        self.events.lock().pop_front()
    }
}

/// Producer side of the URC queue; cheap to clone and share across threads.
#[derive(Clone)]
pub struct UrcSender {
    queue: Arc<UrcQueue>,
}

impl UrcSender {
    pub(crate) fn new(queue: Arc<UrcQueue>) -> Self {
        Self { queue }
    }

    /// Queues an event for delivery at the next cooperative scheduling point.
    pub fn post(&self, event: UrcEvent) -> Result<(), RuntimeError> {
        self.queue.push(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_bounded_and_fifo() {
        let queue = Arc::new(UrcQueue::new(2));
        let sender = UrcSender::new(queue.clone());
        sender.post(UrcEvent::AlarmRing).unwrap();
        sender.post(UrcEvent::NewSms { index: 3 }).unwrap();
        assert_eq!(
            sender.post(UrcEvent::StkProactive),
            Err(RuntimeError::UrcQueueFull(2))
        );

        assert_eq!(queue.pop(), Some(UrcEvent::AlarmRing));
        assert_eq!(queue.pop(), Some(UrcEvent::NewSms { index: 3 }));
        assert_eq!(queue.pop(), None);
    }
}
