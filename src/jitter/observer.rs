use super::Packet;
use tracing::{debug, trace};

/// Notification hooks raised by the engine while it holds its lock.
///
/// Implementations must not call back into the buffer that notifies them.
/// Every method defaults to doing nothing.
pub trait JitterObserver: Send + Sync {
    fn on_packet_loss(&self, _current_time: i64, _target_time: i64, _remaining_duration: i64) {}

    fn on_latency_changed(&self, _latency: i64) {}

    fn on_packet_enqueue(
        &self,
        _current_time: i64,
        _target_time: i64,
        _remaining_duration: i64,
        _packet: &Packet,
    ) {
    }

    fn on_packet_dequeue(
        &self,
        _current_time: i64,
        _target_time: i64,
        _remaining_duration: i64,
        _packets: &[Packet],
    ) {
    }

    fn on_resync_triggered(&self, _old_current_time: i64, _new_current_time: i64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JitterObserver for NoopObserver {}

/// Logs every engine event through `tracing`, tagged with a stream label.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl JitterObserver for TracingObserver {
    fn on_packet_loss(&self, current_time: i64, target_time: i64, remaining_duration: i64) {
        debug!(
            stream = %self.label,
            current = current_time,
            target = target_time,
            remaining = remaining_duration,
            "packet loss"
        );
    }

    fn on_latency_changed(&self, latency: i64) {
        debug!(stream = %self.label, latency, "latency changed");
    }

    fn on_packet_enqueue(
        &self,
        current_time: i64,
        target_time: i64,
        remaining_duration: i64,
        packet: &Packet,
    ) {
        trace!(
            stream = %self.label,
            current = current_time,
            target = target_time,
            remaining = remaining_duration,
            timestamp = packet.timestamp,
            samples = packet.sample_count,
            "packet enqueued"
        );
    }

    fn on_packet_dequeue(
        &self,
        current_time: i64,
        target_time: i64,
        remaining_duration: i64,
        packets: &[Packet],
    ) {
        trace!(
            stream = %self.label,
            current = current_time,
            target = target_time,
            remaining = remaining_duration,
            count = packets.len(),
            first = ?packets.first().map(|p| p.timestamp),
            "packets dequeued"
        );
    }

    fn on_resync_triggered(&self, old_current_time: i64, new_current_time: i64) {
        debug!(
            stream = %self.label,
            old = old_current_time,
            new = new_current_time,
            "resync triggered"
        );
    }
}
