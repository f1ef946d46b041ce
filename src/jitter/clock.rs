/// Playout clock of one stream epoch.
///
/// `current = origin + offset` and `target = current - latency`. Only the
/// consume step moves `offset`; latency changes shift the target without
/// touching the elapsed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutClock {
    origin: i64,
    offset: i64,
    latency: i64,
}

impl PlayoutClock {
    pub fn new(latency: i64) -> Self {
        Self {
            origin: 0,
            offset: 0,
            latency,
        }
    }

    /// Restart the epoch at `origin` with the given starting latency.
    pub fn resync(&mut self, origin: i64, latency: i64) {
        self.origin = origin;
        self.offset = 0;
        self.latency = latency;
    }

    pub fn current_time(&self) -> i64 {
        self.origin + self.offset
    }

    pub fn target_time(&self) -> i64 {
        self.current_time() - self.latency
    }

    pub fn advance(&mut self, by: i64) {
        debug_assert!(by >= 0, "playout clock cannot move backwards");
        self.offset += by.max(0);
    }

    pub fn origin(&self) -> i64 {
        self.origin
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn latency(&self) -> i64 {
        self.latency
    }

    pub fn set_latency(&mut self, latency: i64) {
        self.latency = latency;
    }
}
