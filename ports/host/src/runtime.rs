//! Cooperative runtime loop.

use std::sync::Arc;

use gpio_core::{PinRegistry, TriggerDispatcher};
use gpio_hal::{Clock, GpioHardware};
use log::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::urc::{UrcEvent, UrcQueue, UrcSender};

type UrcHandler = Box<dyn Fn(&UrcEvent) + Send + Sync>;

/// Application-facing runtime on top of a board that is both the GPIO
/// hardware context and the time base.
pub struct Runtime<B: GpioHardware + Clock> {
    config: RuntimeConfig,
    board: Arc<B>,
    registry: Arc<PinRegistry<B>>,
    dispatcher: TriggerDispatcher<B>,
    urcs: Arc<UrcQueue>,
    urc_handler: UrcHandler,
}

impl<B: GpioHardware + Clock> Runtime<B> {
    /// One-time initialisation: validates the configuration, builds the pin
    /// registry and trigger dispatcher on `board` and installs the URC
    /// handler. The handler runs on the cooperative loop and must not block.
    pub fn init<F>(
        config: RuntimeConfig,
        board: Arc<B>,
        urc_handler: F,
    ) -> Result<Self, RuntimeError>
    where
        F: Fn(&UrcEvent) + Send + Sync + 'static,
    {
        config.validate()?;

        let registry = Arc::new(PinRegistry::new(board.clone(), config.gpio.clone()));
        let dispatcher = TriggerDispatcher::new(registry.clone());
        let urcs = Arc::new(UrcQueue::new(config.urc_queue_depth));
        info!("System Ready (console on {})", config.stdio_port);

        Ok(Self {
            config,
            board,
            registry,
            dispatcher,
            urcs,
            urc_handler: Box::new(urc_handler),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn board(&self) -> &Arc<B> {
        &self.board
    }

    pub fn registry(&self) -> &Arc<PinRegistry<B>> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &TriggerDispatcher<B> {
        &self.dispatcher
    }

    pub fn urc_sender(&self) -> UrcSender {
        UrcSender::new(self.urcs.clone())
    }

    pub fn now_ms(&self) -> u64 {
        self.board.now_ms()
    }

    /// Suspends the calling task for `duration_ms`.
    ///
    /// While suspended the runtime wakes at least every `tick_ms`, and at
    /// every debounce expiry, to poll the dispatcher, run pending GPIO
    /// callbacks and deliver queued URCs.
    pub fn sleep(&self, duration_ms: u64) {
        let deadline = self.board.now_ms().saturating_add(duration_ms);
        let tick = u64::from(self.config.tick_ms);
        loop {
            let now = self.board.now_ms();
            self.yield_now();
            if now >= deadline {
                break;
            }

            let mut wake = deadline.min(now + tick);
            if let Some(expiry) = self.dispatcher.next_deadline() {
                wake = wake.min(expiry.max(now + 1));
            }
            self.board.sleep_until(wake);
        }
    }

    /// One scheduling point without suspension. Returns the number of GPIO
    /// notifications and URCs handled.
    pub fn yield_now(&self) -> usize {
        let now = self.board.now_ms();
        self.dispatcher.poll(now);
        let mut handled = self.dispatcher.run_until_idle();
        while let Some(event) = self.urcs.pop() {
            debug!("URC {event:?}");
            (self.urc_handler)(&event);
            handled += 1;
        }
        handled
    }
}
