use super::{BufferFactory, JitterBuffer, JitterFactory, JitterSnapshot, Packet, Playout};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use rtp_rs::{RtpPacketBuilder, RtpReader, Seq};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// One full period of the 32-bit RTP timestamp counter.
pub const TIMESTAMP_WRAP: i64 = 1 << 32;

/// The fields of an RTP packet the jitter buffer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePacket {
    pub ssrc: u32,
    pub sequence: u16,
    pub timestamp: u32,
    pub payload: Bytes,
}

impl WirePacket {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let reader = RtpReader::new(buf).map_err(|e| anyhow!("invalid rtp packet: {:?}", e))?;
        // the reader has already checked the fixed 12-byte header is present
        Ok(Self {
            ssrc: reader.ssrc(),
            sequence: u16::from_be_bytes([buf[2], buf[3]]),
            timestamp: reader.timestamp(),
            payload: Bytes::copy_from_slice(reader.payload()),
        })
    }

    pub fn encode(&self, payload_type: u8) -> Result<Vec<u8>> {
        RtpPacketBuilder::new()
            .payload_type(payload_type)
            .ssrc(self.ssrc)
            .sequence(Seq::from(self.sequence))
            .timestamp(self.timestamp)
            .payload(&self.payload)
            .build()
            .map_err(|e| anyhow!("failed to build rtp packet: {:?}", e))
    }
}

struct Binding<B> {
    buffer: Arc<B>,
    stream_id: u32,
    first_raw_timestamp: u32,
    last_extended_timestamp: i64,
    wrapped: bool,
}

/// Binds one jitter engine to the current source stream.
///
/// A new engine is built on the first packet and whenever the stream identity
/// changes. Raw 32-bit timestamps are extended onto a monotonic 64-bit
/// timeline before they reach the engine.
pub struct StreamBuffer<F: BufferFactory = JitterFactory> {
    factory: F,
    clock_divisor: i64,
    binding: Mutex<Option<Binding<F::Buffer>>>,
}

impl<F: BufferFactory> StreamBuffer<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            clock_divisor: 1,
            binding: Mutex::new(None),
        }
    }

    /// Divide extended timestamps by `divisor` before forwarding, e.g. to turn
    /// 48 kHz RTP ticks into milliseconds.
    pub fn with_clock_divisor(mut self, divisor: i64) -> Self {
        self.clock_divisor = divisor.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<Binding<F::Buffer>>> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forward a packet whose `timestamp` holds the raw 32-bit counter value
    /// and whose `stream_id` identifies the source.
    pub fn put(&self, packet: Packet) {
        let raw_timestamp = packet.timestamp as u32;
        let mut guard = self.lock();

        let binding = match guard.take() {
            Some(binding) if binding.stream_id == packet.stream_id => binding,
            previous => {
                info!(
                    stream_id = packet.stream_id,
                    previous = ?previous.as_ref().map(|b| b.stream_id),
                    first_timestamp = raw_timestamp,
                    "binding new stream"
                );
                Binding {
                    buffer: Arc::new(self.factory.create_buffer()),
                    stream_id: packet.stream_id,
                    first_raw_timestamp: raw_timestamp,
                    last_extended_timestamp: raw_timestamp as i64,
                    wrapped: false,
                }
            }
        };
        let binding = guard.insert(binding);

        let mut extended = raw_timestamp as i64;
        if raw_timestamp < binding.first_raw_timestamp {
            extended += TIMESTAMP_WRAP;
            if !binding.wrapped {
                binding.wrapped = true;
                debug!(
                    stream_id = binding.stream_id,
                    raw = raw_timestamp,
                    extended,
                    "timestamp wrapped"
                );
            }
        }
        binding.last_extended_timestamp = extended;

        binding.buffer.put(Packet {
            timestamp: extended / self.clock_divisor,
            ..packet
        });
    }

    /// `sample_count` is in engine units (after the clock divisor).
    pub fn put_wire(&self, packet: WirePacket, sample_count: i64) {
        self.put(Packet {
            data: packet.payload,
            sample_count,
            timestamp: packet.timestamp as i64,
            stream_id: packet.ssrc,
        });
    }

    pub fn put_rtp(&self, buf: &[u8], sample_count: i64) -> Result<()> {
        let packet = WirePacket::parse(buf)?;
        self.put_wire(packet, sample_count);
        Ok(())
    }

    pub fn get(&self) -> Playout {
        let buffer = self.lock().as_ref().map(|b| b.buffer.clone());
        match buffer {
            Some(buffer) => buffer.get(),
            None => Playout::NotReady,
        }
    }

    pub fn stream_id(&self) -> Option<u32> {
        self.lock().as_ref().map(|b| b.stream_id)
    }

    pub fn last_extended_timestamp(&self) -> Option<i64> {
        self.lock().as_ref().map(|b| b.last_extended_timestamp)
    }
}

impl StreamBuffer<JitterFactory> {
    pub fn snapshot(&self) -> Option<JitterSnapshot> {
        let buffer = self.lock().as_ref().map(|b| b.buffer.clone());
        buffer.map(|buffer| buffer.snapshot())
    }
}

impl<F: BufferFactory> JitterBuffer for StreamBuffer<F> {
    fn put(&self, packet: Packet) {
        StreamBuffer::put(self, packet)
    }

    fn get(&self) -> Playout {
        StreamBuffer::get(self)
    }
}
