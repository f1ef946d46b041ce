use super::store::OrderedStore;

/// How far a packet was from the target time when it arrived, together with
/// the duration it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaSample {
    pub delta: i64,
    pub sample_count: i64,
}

/// Classification of an arrival relative to the target time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    OnTime,
    Late,
    /// Later than `max_latency`; stored for playout but ignored for tuning.
    TooLate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyChange {
    Increased(i64),
    Decreased(i64),
}

impl LatencyChange {
    pub fn latency(&self) -> i64 {
        match *self {
            LatencyChange::Increased(latency) | LatencyChange::Decreased(latency) => latency,
        }
    }
}

/// Retuning bounds, copied out of the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min_latency: i64,
    pub max_latency: i64,
    pub window: i64,
}

impl Bounds {
    /// Late mass (sum of sample counts) above which latency is raised:
    /// 2% of the window.
    pub fn late_threshold(&self) -> i64 {
        self.window * 2 / 100
    }
}

/// Arrival statistics of the current epoch, keyed by packet timestamp.
#[derive(Debug, Default)]
pub struct Statistics {
    on_time: OrderedStore<DeltaSample>,
    late: OrderedStore<DeltaSample>,
    loss: OrderedStore<()>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an arrival whose signed distance to the target time is `delta`.
    pub fn record_arrival(
        &mut self,
        timestamp: i64,
        delta: i64,
        sample_count: i64,
        max_latency: i64,
    ) -> Arrival {
        if delta >= 0 {
            self.on_time.insert(
                timestamp,
                DeltaSample {
                    delta,
                    sample_count,
                },
            );
            Arrival::OnTime
        } else if delta > -max_latency {
            self.late.insert(
                timestamp,
                DeltaSample {
                    delta: -delta,
                    sample_count,
                },
            );
            Arrival::Late
        } else {
            Arrival::TooLate
        }
    }

    pub fn record_loss(&mut self, target_time: i64) {
        self.loss.insert(target_time, ());
    }

    pub fn prune_below(&mut self, bound: i64) {
        self.on_time.remove_below(bound);
        self.late.remove_below(bound);
        self.loss.remove_below(bound);
    }

    pub fn clear(&mut self) {
        self.on_time.clear();
        self.late.clear();
        self.loss.clear();
    }

    pub fn late_mass(&self) -> i64 {
        self.late.values().map(|s| s.sample_count).sum()
    }

    /// Run one retuning step against `latency`.
    ///
    /// Raises latency by the worst observed lateness once the late mass
    /// crosses the threshold; otherwise lowers it by the smallest on-time
    /// margin when there has been neither loss nor lateness. A change clears
    /// the late statistics.
    pub fn adapt(&mut self, latency: i64, bounds: &Bounds) -> Option<LatencyChange> {
        let change = if self.late_mass() > bounds.late_threshold() {
            let worst = self.late.values().map(|s| s.delta).max().unwrap_or(0);
            let candidate = (latency + worst).min(bounds.max_latency);
            (candidate != latency).then_some(LatencyChange::Increased(candidate))
        } else if self.loss.is_empty() && self.late.is_empty() {
            // without on-time samples there is nothing to loosen on
            self.on_time
                .values()
                .map(|s| s.delta)
                .min()
                .map(|margin| (latency - margin).max(bounds.min_latency))
                .filter(|&candidate| candidate != latency)
                .map(LatencyChange::Decreased)
        } else {
            None
        };

        if change.is_some() {
            self.late.clear();
        }
        change
    }

    pub fn on_time_len(&self) -> usize {
        self.on_time.len()
    }

    pub fn late_len(&self) -> usize {
        self.late.len()
    }

    pub fn loss_len(&self) -> usize {
        self.loss.len()
    }
}
