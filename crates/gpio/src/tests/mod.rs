use std::sync::{Arc, Mutex};

use gpio_hal::sim::SimBoard;
use gpio_hal::{Clock, Level, PinId};

use crate::config::GpioConfig;
use crate::dispatcher::TriggerDispatcher;
use crate::registry::{PinHandle, PinRegistry};

mod dispatcher;

const LED: PinId = PinId(13);
const BUTTON: PinId = PinId(1);

struct Bench {
    board: Arc<SimBoard>,
    registry: Arc<PinRegistry<SimBoard>>,
    dispatcher: TriggerDispatcher<SimBoard>,
}

impl Bench {
    fn new() -> Self {
        Self::with_config(GpioConfig::default())
    }

    fn with_config(config: GpioConfig) -> Self {
        let board = Arc::new(SimBoard::with_pin_count(16));
        let registry = Arc::new(PinRegistry::new(board.clone(), config));
        let dispatcher = TriggerDispatcher::new(registry.clone());
        Self {
            board,
            registry,
            dispatcher,
        }
    }

    /// Advances virtual time in 1 ms steps, polling and dispatching each step.
    fn run_until(&self, until_ms: u64) {
        let mut now = self.board.now_ms();
        while now < until_ms {
            now += 1;
            self.board.advance_to(now);
            self.dispatcher.poll(now);
            self.dispatcher.run_until_idle();
        }
    }
}

#[derive(Clone, Default)]
struct Collector {
    events: Arc<Mutex<Vec<(PinHandle, PinId, Level, u64)>>>,
}

impl Collector {
    fn callback(
        &self,
        board: &Arc<SimBoard>,
    ) -> impl Fn(PinHandle, PinId, Level) + Send + Sync + 'static {
        let events = self.events.clone();
        let board = board.clone();
        move |handle, pin, level| {
            events
                .lock()
                .unwrap()
                .push((handle, pin, level, board.now_ms()));
        }
    }

    fn levels(&self) -> Vec<Level> {
        self.events.lock().unwrap().iter().map(|e| e.2).collect()
    }

    fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}
