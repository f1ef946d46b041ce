use bytes::Bytes;

pub mod clock;
pub mod controller;
pub mod engine;
pub mod observer;
pub mod store;
pub mod stream;
#[cfg(test)]
mod tests;

pub use engine::{Jitter, JitterFactory, JitterSnapshot};
pub use observer::{JitterObserver, NoopObserver, TracingObserver};
pub use stream::{StreamBuffer, WirePacket};

/// A media packet on the extended (non-wrapping) stream timeline.
///
/// `sample_count` is the duration the packet covers, in the same units as
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Bytes,
    pub sample_count: i64,
    pub timestamp: i64,
    pub stream_id: u32,
}

impl Packet {
    pub fn new(timestamp: i64, sample_count: i64, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            sample_count,
            timestamp,
            stream_id: 0,
        }
    }

    pub fn with_stream_id(mut self, stream_id: u32) -> Self {
        self.stream_id = stream_id;
        self
    }

    /// Timestamp right after the last sample of this packet.
    pub fn end_timestamp(&self) -> i64 {
        self.timestamp + self.sample_count
    }
}

/// Outcome of one consume tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playout {
    /// Nothing has been ingested yet.
    NotReady,
    /// No packet covered the target time; the clock still advanced one tick.
    Loss,
    /// Non-empty run of packets in ascending timestamp order.
    Packets(Vec<Packet>),
}

impl Playout {
    pub fn is_ok(&self) -> bool {
        matches!(self, Playout::Packets(_))
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, Playout::Loss)
    }

    pub fn packets(&self) -> &[Packet] {
        match self {
            Playout::Packets(packets) => packets,
            _ => &[],
        }
    }

    pub fn into_packets(self) -> Vec<Packet> {
        match self {
            Playout::Packets(packets) => packets,
            _ => Vec::new(),
        }
    }
}

/// Ingest/consume contract shared by the engine and the stream wrapper.
pub trait JitterBuffer: Send + Sync {
    fn put(&self, packet: Packet);
    fn get(&self) -> Playout;
}

/// Builds one fresh buffer per stream epoch.
pub trait BufferFactory: Send + Sync {
    type Buffer: JitterBuffer;

    fn create_buffer(&self) -> Self::Buffer;
}
