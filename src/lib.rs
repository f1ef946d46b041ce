pub mod config;
pub mod jitter;
pub mod version;

pub use config::JitterConfig;
pub use jitter::{
    BufferFactory, Jitter, JitterBuffer, JitterFactory, JitterObserver, Packet, Playout,
    StreamBuffer,
};
