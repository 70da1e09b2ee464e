//! GPIO example application.
//!
//! Claims an LED output (default high) and a pulled-up button input, arms a
//! both-edge debounced trigger on the button and toggles the LED from the
//! cooperative main loop. Runs on the simulated board; the button press is
//! scripted from the command line, bounce included.

mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gpio_core::{Edge, Level, PinFlags, PinHandle, PinId};
use gpio_hal::sim::SimBoard;
use gpio_port_host::{log_urc, Runtime, RuntimeConfig, SimState, UrcEvent};
use log::{error, info};

const BOARD_PINS: u16 = 32;
/// Spacing of scripted contact bounces.
const BOUNCE_STEP_MS: u64 = 2;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EdgeArg {
    Rising,
    Falling,
    Both,
}

impl From<EdgeArg> for Edge {
    fn from(value: EdgeArg) -> Self {
        match value {
            EdgeArg::Rising => Edge::Rising,
            EdgeArg::Falling => Edge::Falling,
            EdgeArg::Both => Edge::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "GPIO toggle and debounced input demo")]
struct Opts {
    #[arg(long, default_value = "/dev/ttyS0", value_name = "PATH")]
    port: String,

    #[arg(long, default_value_t = 13)]
    led_pin: u16,

    #[arg(long, default_value_t = 1)]
    input_pin: u16,

    #[arg(long, default_value_t = 100)]
    debounce_ms: u32,

    #[arg(long, value_enum, default_value_t = EdgeArg::Both)]
    edge: EdgeArg,

    /// Half-period of the LED toggle loop.
    #[arg(long, default_value_t = 500)]
    toggle_ms: u64,

    /// Number of low/high toggle cycles before exiting.
    #[arg(long, default_value_t = 3)]
    cycles: u32,

    #[arg(long, default_value_t = 1200)]
    press_at_ms: u64,

    #[arg(long, default_value_t = 150)]
    press_ms: u64,

    /// Contact bounces added after the press and after the release.
    #[arg(long, default_value_t = 3)]
    bounces: u32,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    #[arg(long = "no-color")]
    no_color: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    console::init(opts.log_level, !opts.no_color).context("installing console logger")?;

    let board = Arc::new(SimBoard::with_pin_count(BOARD_PINS));
    script_button(&board, &opts);

    let config = RuntimeConfig::builder().stdio_port(opts.port.clone()).build();
    let rt = Runtime::init(config, board.clone(), log_urc).context("runtime init")?;

    // The simulated modem reports a ready SIM shortly after boot.
    rt.urc_sender()
        .post(UrcEvent::SimCard(SimState::Ready))
        .context("posting SIM state")?;

    let led = request_led(&rt, PinId(opts.led_pin));
    request_button(&rt, PinId(opts.input_pin), &opts);
    info!("System Initialization finished");

    for _ in 0..opts.cycles {
        set_led(&rt, led, Level::Low);
        rt.sleep(opts.toggle_ms);
        set_led(&rt, led, Level::High);
        rt.sleep(opts.toggle_ms);
    }

    let stats = rt.dispatcher().stats();
    info!(
        "done at {} ms: {} raw edges, {} notifications delivered, {} dropped",
        rt.now_ms(),
        stats.edges_seen,
        stats.notifications_delivered,
        stats.notifications_dropped
    );
    Ok(())
}

fn request_led(rt: &Runtime<SimBoard>, pin: PinId) -> Option<PinHandle> {
    match rt
        .registry()
        .request(pin, PinFlags::OUTPUT | PinFlags::DEFAULT_HIGH)
    {
        Ok(handle) => {
            info!("{pin} handle: {handle}");
            Some(handle)
        }
        Err(err) => {
            error!("{pin} request fail: {err}");
            None
        }
    }
}

fn request_button(rt: &Runtime<SimBoard>, pin: PinId, opts: &Opts) {
    let handle = match rt
        .registry()
        .request(pin, PinFlags::INPUT | PinFlags::PULL_UP)
    {
        Ok(handle) => handle,
        Err(err) => {
            error!("{pin} input request fail: {err}");
            return;
        }
    };
    info!("{pin} input handle: {handle}");
    match rt.registry().read(handle) {
        Ok(level) => info!("GPIO current state: {level}"),
        Err(err) => error!("{pin} read fail: {err}"),
    }

    let result = rt.dispatcher().trigger_enable(
        handle,
        |_, pin, level| info!("GPIO {} state changed: {}", pin.number(), level),
        opts.debounce_ms,
        opts.edge.into(),
    );
    if let Err(err) = result {
        error!("{pin} trigger enable fail: {err}");
    }
}

fn set_led(rt: &Runtime<SimBoard>, led: Option<PinHandle>, level: Level) {
    if let Some(handle) = led {
        if let Err(err) = rt.registry().write(handle, level) {
            error!("LED write fail: {err}");
        }
    }
}

/// Schedules the press and release of the button, each followed by bounces.
fn script_button(board: &SimBoard, opts: &Opts) {
    let pin = PinId(opts.input_pin);
    let release_at = opts.press_at_ms + opts.press_ms;

    for (start, settle) in [(opts.press_at_ms, Some(Level::Low)), (release_at, None)] {
        let bounce = match settle {
            Some(_) => None,
            None => Some(Level::Low),
        };
        board.schedule(start, pin, settle);
        for i in 0..u64::from(opts.bounces) {
            let t = start + BOUNCE_STEP_MS * (2 * i + 1);
            board.schedule(t, pin, bounce);
            board.schedule(t + BOUNCE_STEP_MS, pin, settle);
        }
    }
}
