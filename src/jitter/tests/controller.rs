use crate::jitter::clock::PlayoutClock;
use crate::jitter::controller::{Arrival, Bounds, LatencyChange, Statistics};

fn bounds() -> Bounds {
    Bounds {
        min_latency: 100,
        max_latency: 400,
        window: 1000,
    }
}

#[test]
fn test_clock_target_follows_latency() {
    let mut clock = PlayoutClock::new(100);
    clock.resync(1000, 100);
    assert_eq!(clock.current_time(), 1000);
    assert_eq!(clock.target_time(), 900);

    clock.advance(40);
    assert_eq!(clock.offset(), 40);
    assert_eq!(clock.target_time(), 940);

    clock.set_latency(280);
    assert_eq!(clock.current_time(), 1040);
    assert_eq!(clock.target_time(), 760);

    clock.resync(5000, 100);
    assert_eq!(clock.origin(), 5000);
    assert_eq!(clock.offset(), 0);
    assert_eq!(clock.latency(), 100);
}

#[test]
fn test_classify_arrivals() {
    let mut stats = Statistics::new();
    assert_eq!(stats.record_arrival(1000, 0, 20, 400), Arrival::OnTime);
    assert_eq!(stats.record_arrival(1020, 120, 20, 400), Arrival::OnTime);
    assert_eq!(stats.record_arrival(1040, -399, 20, 400), Arrival::Late);
    assert_eq!(stats.record_arrival(1060, -400, 20, 400), Arrival::TooLate);

    assert_eq!(stats.on_time_len(), 2);
    assert_eq!(stats.late_len(), 1);
    assert_eq!(stats.late_mass(), 20);
}

#[test]
fn test_late_mass_at_threshold_keeps_latency() {
    let mut stats = Statistics::new();
    // 2% of a 1000 window is 20; one 20-sample packet is not above it
    stats.record_arrival(1000, -150, 20, 400);

    assert_eq!(stats.adapt(100, &bounds()), None);
    assert_eq!(stats.late_len(), 1);
}

#[test]
fn test_late_mass_above_threshold_raises_latency() {
    let mut stats = Statistics::new();
    stats.record_arrival(1020, -180, 20, 400);
    stats.record_arrival(1040, -160, 20, 400);

    assert_eq!(
        stats.adapt(100, &bounds()),
        Some(LatencyChange::Increased(280))
    );
    assert_eq!(stats.late_len(), 0);
}

#[test]
fn test_raise_is_capped_at_max_latency() {
    let mut stats = Statistics::new();
    stats.record_arrival(1020, -350, 20, 400);
    stats.record_arrival(1040, -300, 20, 400);

    let change = stats.adapt(200, &bounds());
    assert_eq!(change, Some(LatencyChange::Increased(400)));

    stats.record_arrival(1060, -300, 20, 400);
    stats.record_arrival(1080, -300, 20, 400);
    // already at the cap: nothing changes, late samples stay
    assert_eq!(stats.adapt(400, &bounds()), None);
    assert_eq!(stats.late_len(), 2);
}

#[test]
fn test_stable_stream_lowers_latency() {
    let mut stats = Statistics::new();
    stats.record_arrival(1000, 50, 20, 400);
    stats.record_arrival(1020, 30, 20, 400);

    assert_eq!(
        stats.adapt(200, &bounds()),
        Some(LatencyChange::Decreased(170))
    );
    assert_eq!(
        stats.adapt(120, &bounds()),
        Some(LatencyChange::Decreased(100))
    );
    assert_eq!(stats.adapt(100, &bounds()), None);
}

#[test]
fn test_loss_or_late_blocks_lowering() {
    let mut stats = Statistics::new();
    stats.record_arrival(1000, 50, 20, 400);
    stats.record_loss(900);
    assert_eq!(stats.adapt(200, &bounds()), None);

    let mut stats = Statistics::new();
    stats.record_arrival(1000, 50, 20, 400);
    stats.record_arrival(1020, -10, 5, 400);
    assert_eq!(stats.adapt(200, &bounds()), None);
}

#[test]
fn test_no_statistics_keeps_latency() {
    let mut stats = Statistics::new();
    assert_eq!(stats.adapt(250, &bounds()), None);
}

#[test]
fn test_prune_drops_old_entries() {
    let mut stats = Statistics::new();
    stats.record_arrival(100, 10, 20, 400);
    stats.record_arrival(200, -10, 20, 400);
    stats.record_loss(300);
    stats.record_loss(500);

    stats.prune_below(400);
    assert_eq!(stats.on_time_len(), 0);
    assert_eq!(stats.late_len(), 0);
    assert_eq!(stats.loss_len(), 1);

    stats.clear();
    assert_eq!(stats.loss_len(), 0);
}
