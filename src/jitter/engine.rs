use super::{
    clock::PlayoutClock,
    controller::{Bounds, Statistics},
    observer::{JitterObserver, NoopObserver},
    store::OrderedStore,
    BufferFactory, JitterBuffer, Packet, Playout,
};
use crate::config::JitterConfig;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Adaptive jitter engine for a single stream timeline.
///
/// `put` and `get` serialize on one lock. The observer is called while that
/// lock is held.
pub struct Jitter {
    config: JitterConfig,
    observer: Arc<dyn JitterObserver>,
    state: Mutex<JitterState>,
}

struct JitterState {
    initialized: bool,
    clock: PlayoutClock,
    pending: OrderedStore<Packet>,
    stats: Statistics,
}

/// Point-in-time view of the engine, mostly for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JitterSnapshot {
    pub initialized: bool,
    pub stream_origin: i64,
    pub offset: i64,
    pub latency: i64,
    pub current_time: i64,
    pub target_time: i64,
    pub pending: usize,
    pub on_time: usize,
    pub late: usize,
    pub loss_markers: usize,
    pub remaining_duration: i64,
}

impl JitterState {
    fn resync(&mut self, origin: i64, latency: i64) {
        self.clock.resync(origin, latency);
        self.stats.clear();
        self.initialized = true;
    }

    // Playable backlog: pending packets at or past the target time.
    fn remaining_duration(&self) -> i64 {
        let target = self.clock.target_time();
        self.pending
            .iter()
            .filter(|(timestamp, _)| *timestamp >= target)
            .map(|(_, packet)| packet.sample_count)
            .sum()
    }

    fn dequeue_before(&mut self, threshold: i64) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Some((_, packet)) = self.pending.pop_first_below(threshold) {
            packets.push(packet);
        }
        packets
    }
}

impl Jitter {
    pub fn new(config: JitterConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: JitterConfig, observer: Arc<dyn JitterObserver>) -> Self {
        Self {
            state: Mutex::new(JitterState {
                initialized: false,
                clock: PlayoutClock::new(config.min_latency),
                pending: OrderedStore::new(),
                stats: Statistics::new(),
            }),
            config,
            observer,
        }
    }

    pub fn config(&self) -> &JitterConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, JitterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            min_latency: self.config.min_latency,
            max_latency: self.config.max_latency,
            window: self.config.window,
        }
    }

    pub fn put(&self, packet: Packet) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let current_time = state.clock.current_time();
        let target_time = state.clock.target_time();
        let max_latency = self.config.max_latency;

        let out_of_range = packet.timestamp.abs_diff(current_time) > max_latency.unsigned_abs();
        if !state.initialized || out_of_range {
            state.resync(packet.timestamp, self.config.min_latency);
            debug!(
                old = current_time,
                new = state.clock.current_time(),
                stream_id = packet.stream_id,
                "jitter resync"
            );
            self.observer
                .on_resync_triggered(current_time, state.clock.current_time());
        }

        let delta = packet.timestamp - state.clock.target_time();
        state
            .stats
            .record_arrival(packet.timestamp, delta, packet.sample_count, max_latency);
        state.pending.insert(packet.timestamp, packet.clone());

        self.observer.on_packet_enqueue(
            current_time,
            target_time,
            state.remaining_duration(),
            &packet,
        );
    }

    pub fn get(&self) -> Playout {
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.initialized {
            return Playout::NotReady;
        }

        self.retune(state);

        let target_time = state.clock.target_time();
        state.pending.remove_below(target_time);
        state.stats.prune_below(target_time - self.config.window);

        let tick = self.config.tick_interval;
        let packets = state.dequeue_before(target_time + tick);

        let Some(last) = packets.last() else {
            state.stats.record_loss(target_time);
            state.clock.advance(tick);
            trace!(target = target_time, "jitter loss");
            self.observer.on_packet_loss(
                state.clock.current_time(),
                state.clock.target_time(),
                state.remaining_duration(),
            );
            return Playout::Loss;
        };

        let next_target = last.end_timestamp().max(target_time + tick);
        state.clock.advance(next_target - target_time);
        self.observer.on_packet_dequeue(
            state.clock.current_time(),
            state.clock.target_time(),
            state.remaining_duration(),
            &packets,
        );
        Playout::Packets(packets)
    }

    pub fn latency(&self) -> i64 {
        self.lock().clock.latency()
    }

    pub fn current_time(&self) -> i64 {
        self.lock().clock.current_time()
    }

    pub fn target_time(&self) -> i64 {
        self.lock().clock.target_time()
    }

    pub fn snapshot(&self) -> JitterSnapshot {
        let state = self.lock();
        JitterSnapshot {
            initialized: state.initialized,
            stream_origin: state.clock.origin(),
            offset: state.clock.offset(),
            latency: state.clock.latency(),
            current_time: state.clock.current_time(),
            target_time: state.clock.target_time(),
            pending: state.pending.len(),
            on_time: state.stats.on_time_len(),
            late: state.stats.late_len(),
            loss_markers: state.stats.loss_len(),
            remaining_duration: state.remaining_duration(),
        }
    }

    fn retune(&self, state: &mut JitterState) {
        if let Some(change) = state.stats.adapt(state.clock.latency(), &self.bounds()) {
            debug!(
                old = state.clock.latency(),
                new = change.latency(),
                "jitter latency changed"
            );
            state.clock.set_latency(change.latency());
            self.observer.on_latency_changed(change.latency());
        }
    }

    /// Run the controller outside a consume step.
    #[cfg(test)]
    pub(crate) fn adapt(&self) {
        let mut guard = self.lock();
        self.retune(&mut guard);
    }
}

impl JitterBuffer for Jitter {
    fn put(&self, packet: Packet) {
        Jitter::put(self, packet)
    }

    fn get(&self) -> Playout {
        Jitter::get(self)
    }
}

/// Creates engines sharing one configuration and observer.
#[derive(Clone)]
pub struct JitterFactory {
    config: JitterConfig,
    observer: Arc<dyn JitterObserver>,
}

impl JitterFactory {
    pub fn new(config: JitterConfig) -> Self {
        Self {
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn JitterObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &JitterConfig {
        &self.config
    }

    pub fn create(&self) -> Jitter {
        Jitter::with_observer(self.config.clone(), self.observer.clone())
    }
}

impl BufferFactory for JitterFactory {
    type Buffer = Jitter;

    fn create_buffer(&self) -> Jitter {
        self.create()
    }
}
