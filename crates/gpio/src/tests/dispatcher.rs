use gpio_hal::{Edge, EdgeSink, Level, PinId};

use super::{Bench, Collector, BUTTON, LED};
use crate::config::GpioConfig;
use crate::error::{ErrorKind, GpioError};
use crate::flags::PinFlags;

fn button(bench: &Bench) -> crate::PinHandle {
    bench
        .registry
        .request(BUTTON, PinFlags::INPUT | PinFlags::PULL_UP)
        .unwrap()
}

#[test]
fn bounces_produce_a_single_notification() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 100, Edge::Both)
        .unwrap();

    // Press at 10 ms, then five bounces 4 ms apart, ending low at 30 ms.
    bench.board.schedule(10, BUTTON, Some(Level::Low));
    for (i, t) in [14, 18, 22, 26, 30].into_iter().enumerate() {
        let level = if i % 2 == 0 { Level::High } else { Level::Low };
        bench.board.schedule(t, BUTTON, Some(level));
    }
    bench.board.schedule(30, BUTTON, Some(Level::Low));
    bench.run_until(400);

    let events = collector.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    let (h, pin, level, at) = events[0];
    assert_eq!((h, pin, level), (handle, BUTTON, Level::Low));
    assert_eq!(at, 130);
}

#[test]
fn separated_transitions_are_delivered_in_order() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 100, Edge::Both)
        .unwrap();

    bench.board.schedule_press(BUTTON, 50, 150);
    bench.run_until(500);

    let events = collector.events.lock().unwrap().clone();
    assert_eq!(collector.levels(), vec![Level::Low, Level::High]);
    assert!(events[0].3 >= 150);
    assert!(events[1].3 >= 300);
}

#[test]
fn callback_runs_only_on_dispatch() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 20, Edge::Both)
        .unwrap();

    bench.board.drive(BUTTON, Level::Low).unwrap();
    assert!(bench.dispatcher.has_raw_edges());
    assert_eq!(collector.count(), 0);

    assert_eq!(bench.dispatcher.poll(0), 0);
    assert_eq!(bench.dispatcher.next_deadline(), Some(20));

    assert_eq!(bench.dispatcher.poll(20), 1);
    assert_eq!(bench.dispatcher.pending(), 1);
    assert_eq!(collector.count(), 0);

    assert_eq!(bench.dispatcher.run_until_idle(), 1);
    assert_eq!(collector.levels(), vec![Level::Low]);
    assert_eq!(bench.dispatcher.next_deadline(), None);
}

#[test]
fn disable_during_debounce_suppresses_callback() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 100, Edge::Both)
        .unwrap();

    bench.board.schedule(10, BUTTON, Some(Level::Low));
    bench.run_until(60);
    bench.dispatcher.trigger_disable(handle).unwrap();
    bench.run_until(400);

    assert_eq!(collector.count(), 0);
    assert!(!bench.dispatcher.is_registered(handle));
    assert!(!bench.board.interrupt_enabled(BUTTON));
}

#[test]
fn disable_drops_already_queued_notifications() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 10, Edge::Both)
        .unwrap();

    bench.board.drive(BUTTON, Level::Low).unwrap();
    bench.dispatcher.poll(0);
    assert_eq!(bench.dispatcher.poll(10), 1);
    bench.dispatcher.trigger_disable(handle).unwrap();

    assert_eq!(bench.dispatcher.pending(), 0);
    assert_eq!(bench.dispatcher.run_until_idle(), 0);
    assert_eq!(collector.count(), 0);
    assert_eq!(bench.dispatcher.stats().notifications_stale, 1);
}

#[test]
fn release_cancels_pending_debounce_and_queue() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 10, Edge::Both)
        .unwrap();

    bench.board.drive(BUTTON, Level::Low).unwrap();
    bench.dispatcher.poll(0);
    bench.dispatcher.poll(10);
    bench.registry.release(handle).unwrap();

    assert_eq!(bench.dispatcher.run_until_idle(), 1);
    assert_eq!(collector.count(), 0);
    assert_eq!(bench.dispatcher.stats().notifications_stale, 1);
    assert!(!bench.board.interrupt_enabled(BUTTON));
}

#[test]
fn rising_policy_ignores_falling_transitions() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 50, Edge::Rising)
        .unwrap();

    bench.board.schedule_press(BUTTON, 10, 200);
    bench.board.schedule_press(BUTTON, 400, 200);
    bench.run_until(800);

    assert_eq!(collector.levels(), vec![Level::High, Level::High]);
    assert_eq!(bench.dispatcher.stats().transitions_filtered, 2);
}

#[test]
fn falling_policy_reports_only_low() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 50, Edge::Falling)
        .unwrap();

    bench.board.schedule_press(BUTTON, 10, 200);
    bench.run_until(500);

    assert_eq!(collector.levels(), vec![Level::Low]);
}

#[test]
fn glitch_shorter_than_interval_is_rejected() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 100, Edge::Both)
        .unwrap();

    bench.board.schedule_press(BUTTON, 10, 30);
    bench.run_until(300);

    assert_eq!(collector.count(), 0);
    assert_eq!(bench.dispatcher.stats().edges_seen, 2);
}

#[test]
fn registration_rules() {
    let bench = Bench::new();
    let input = button(&bench);
    let output = bench.registry.request(LED, PinFlags::OUTPUT).unwrap();

    let err = bench
        .dispatcher
        .trigger_enable(output, |_, _, _| {}, 100, Edge::Both)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);

    bench
        .dispatcher
        .trigger_enable(input, |_, _, _| {}, 100, Edge::Both)
        .unwrap();
    let err = bench
        .dispatcher
        .trigger_enable(input, |_, _, _| {}, 50, Edge::Rising)
        .unwrap_err();
    assert_eq!(err, GpioError::DuplicateRegistration(input));
    assert_eq!(err.kind(), ErrorKind::DuplicateRegistration);

    bench.dispatcher.trigger_disable(input).unwrap();
    assert_eq!(
        bench.dispatcher.trigger_disable(input).unwrap_err(),
        GpioError::NotRegistered(input)
    );
    bench
        .dispatcher
        .trigger_enable(input, |_, _, _| {}, 50, Edge::Rising)
        .unwrap();
}

#[test]
fn debounce_limit_is_enforced() {
    let bench = Bench::with_config(GpioConfig::builder().max_debounce_ms(500).build());
    let handle = button(&bench);
    assert_eq!(
        bench
            .dispatcher
            .trigger_enable(handle, |_, _, _| {}, 501, Edge::Both)
            .unwrap_err(),
        GpioError::DebounceTooLong {
            requested: 501,
            limit: 500
        }
    );
}

#[test]
fn full_dispatch_queue_drops_notifications() {
    let bench = Bench::with_config(GpioConfig::builder().dispatch_queue_depth(1).build());
    let collector = Collector::default();
    for pin in [PinId(3), PinId(4)] {
        let handle = bench
            .registry
            .request(pin, PinFlags::INPUT | PinFlags::PULL_UP)
            .unwrap();
        bench
            .dispatcher
            .trigger_enable(handle, collector.callback(&bench.board), 10, Edge::Both)
            .unwrap();
        bench.board.drive(pin, Level::Low).unwrap();
    }

    bench.dispatcher.poll(0);
    assert_eq!(bench.dispatcher.poll(10), 1);
    assert_eq!(bench.dispatcher.run_until_idle(), 1);

    let stats = bench.dispatcher.stats();
    assert_eq!(stats.notifications_dropped, 1);
    assert_eq!(stats.notifications_delivered, 1);
    assert_eq!(collector.count(), 1);
}

#[test]
fn edge_buffer_overflow_resamples_pins() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 10, Edge::Both)
        .unwrap();

    // Far more edges than the buffer holds, ending low, with no poll in between.
    for n in 0..(crate::EDGE_QUEUE_DEPTH + 9) {
        let level = if n % 2 == 0 { Level::Low } else { Level::High };
        bench.board.drive(BUTTON, level).unwrap();
    }
    assert_eq!(bench.registry.read(handle).unwrap(), Level::Low);

    bench.dispatcher.poll(5);
    assert_eq!(bench.dispatcher.stats().edge_overflows, 1);
    assert_eq!(bench.dispatcher.next_deadline(), Some(15));

    bench.dispatcher.poll(15);
    bench.dispatcher.run_until_idle();
    assert_eq!(collector.levels(), vec![Level::Low]);
}

#[test]
fn edges_on_untriggered_pins_are_ignored() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 10, Edge::Both)
        .unwrap();

    // Edge recorded for a pin nobody triggers on.
    bench.dispatcher.edge_sink().on_edge(PinId(9), Level::High, 0);
    bench.dispatcher.poll(0);
    assert_eq!(bench.dispatcher.stats().edges_ignored, 1);
    assert_eq!(bench.dispatcher.next_deadline(), None);
}

#[test]
fn callback_may_disable_its_own_trigger() {
    use std::sync::{Arc, Mutex};

    let bench = Arc::new(Bench::new());
    let handle = button(&bench);
    let calls = Arc::new(Mutex::new(0u32));

    let calls_cb = calls.clone();
    let weak = Arc::downgrade(&bench);
    bench
        .dispatcher
        .trigger_enable(
            handle,
            move |h, _, _| {
                *calls_cb.lock().unwrap() += 1;
                if let Some(bench) = weak.upgrade() {
                    bench.dispatcher.trigger_disable(h).unwrap();
                }
            },
            10,
            Edge::Both,
        )
        .unwrap();

    bench.board.schedule_press(BUTTON, 5, 50);
    bench.run_until(200);

    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(!bench.dispatcher.is_registered(handle));
}

#[test]
fn one_poll_delivers_every_transition_settled_since_the_last() {
    let bench = Bench::new();
    let handle = button(&bench);
    let collector = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, collector.callback(&bench.board), 100, Edge::Both)
        .unwrap();

    // Press and release both settle long before anyone polls.
    bench.board.schedule_press(BUTTON, 10, 150);
    bench.board.advance_to(400);
    assert_eq!(bench.dispatcher.poll(400), 2);

    let settled: Vec<_> = bench
        .dispatcher
        .pending_notifications()
        .iter()
        .map(|n| (n.level, n.settled_at_ms))
        .collect();
    assert_eq!(settled, vec![(Level::Low, 110), (Level::High, 260)]);

    bench.dispatcher.run_until_idle();
    assert_eq!(collector.levels(), vec![Level::Low, Level::High]);
}

#[test]
fn reenabled_trigger_ignores_edges_buffered_before_disable() {
    let bench = Bench::new();
    let handle = button(&bench);
    let first = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, first.callback(&bench.board), 10, Edge::Both)
        .unwrap();

    // Edge reaches the buffer but no poll runs before the disable.
    bench.board.drive(BUTTON, Level::Low).unwrap();
    assert!(bench.dispatcher.has_raw_edges());
    bench.dispatcher.trigger_disable(handle).unwrap();
    assert!(!bench.dispatcher.has_raw_edges());

    let second = Collector::default();
    bench
        .dispatcher
        .trigger_enable(handle, second.callback(&bench.board), 10, Edge::Both)
        .unwrap();
    bench.dispatcher.poll(0);
    assert_eq!(bench.dispatcher.next_deadline(), None);
    assert_eq!(bench.dispatcher.stats().edges_seen, 0);

    bench.run_until(100);
    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 0);
}
