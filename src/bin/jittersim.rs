use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rustjitter::{
    config::Config,
    jitter::{JitterFactory, JitterSnapshot, Playout, StreamBuffer, TracingObserver, WirePacket},
    version,
};
use serde::Serialize;
use std::{fs::File, sync::Arc, time::Duration};
use tokio::time::{self, Instant};
use tracing::{info, level_filters::LevelFilter, warn};

const PAYLOAD_TYPE: u8 = 111;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version = version::get_short_version(),
    about = "Replays a synthetic jittery RTP stream through the adaptive jitter buffer",
    long_about = version::get_version_info()
)]
struct Cli {
    #[clap(long, help = "Path to the config file")]
    conf: Option<String>,

    #[clap(long, help = "Number of packets to send")]
    packets: Option<u32>,

    #[clap(long, help = "Maximum random network jitter in milliseconds")]
    jitter_ms: Option<u64>,

    #[clap(long, help = "Probability of dropping a packet (0.0 - 1.0)")]
    loss_rate: Option<f64>,

    #[clap(long, help = "Seed for the random generator")]
    seed: Option<u64>,

    #[clap(long, help = "Log the engine state after every tick", action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    sent: u32,
    dropped_by_network: u32,
    delivered: usize,
    lost_ticks: u32,
    not_ready_ticks: u32,
    max_latency_seen: i64,
    final_state: Option<JitterSnapshot>,
}

struct Scheduled {
    arrival: Duration,
    buf: Vec<u8>,
}

fn build_schedule(config: &Config, summary: &mut Summary) -> Result<Vec<Scheduled>> {
    let sim = &config.simulation;
    let tick = config.jitter.tick_interval as u64;
    let mut rng = match sim.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let loss_rate = sim.loss_rate.clamp(0.0, 1.0);

    let mut schedule = Vec::with_capacity(sim.packets as usize);
    for i in 0..sim.packets {
        summary.sent += 1;
        if rng.random_bool(loss_rate) {
            summary.dropped_by_network += 1;
            continue;
        }
        let packet = WirePacket {
            ssrc: sim.ssrc,
            sequence: i as u16,
            timestamp: sim
                .initial_timestamp
                .wrapping_add(i.wrapping_mul(tick as u32)),
            payload: Bytes::from(i.to_be_bytes().to_vec()),
        };
        let delay = sim.base_delay_ms + rng.random_range(0..=sim.jitter_ms);
        schedule.push(Scheduled {
            arrival: Duration::from_millis(i as u64 * tick + delay),
            buf: packet.encode(PAYLOAD_TYPE)?,
        });
    }
    schedule.sort_by_key(|s| s.arrival);
    Ok(schedule)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.conf {
        Some(ref conf) => Config::load(conf)?,
        None => Config::default(),
    };
    if let Some(packets) = cli.packets {
        config.simulation.packets = packets;
    }
    if let Some(jitter_ms) = cli.jitter_ms {
        config.simulation.jitter_ms = jitter_ms;
    }
    if let Some(loss_rate) = cli.loss_rate {
        config.simulation.loss_rate = loss_rate;
    }
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }
    config.jitter.validate()?;

    let mut log_fmt = tracing_subscriber::fmt();
    if let Some(ref level) = config.log_level {
        if let Ok(lv) = level.as_str().parse::<LevelFilter>() {
            log_fmt = log_fmt.with_max_level(lv);
        }
    }
    let _guard = if let Some(ref log_file) = config.log_file {
        let file = File::create(log_file)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        log_fmt.with_writer(non_blocking).try_init().ok();
        Some(guard)
    } else {
        log_fmt.try_init().ok();
        None
    };

    let mut summary = Summary::default();
    let schedule = build_schedule(&config, &mut summary)?;
    let tick = config.jitter.tick_interval;

    let observer = Arc::new(TracingObserver::new(format!("{:08x}", config.simulation.ssrc)));
    let factory = JitterFactory::new(config.jitter.clone()).with_observer(observer);
    let buffer = Arc::new(StreamBuffer::new(factory));

    info!(
        packets = config.simulation.packets,
        jitter_ms = config.simulation.jitter_ms,
        loss_rate = config.simulation.loss_rate,
        "starting simulation"
    );

    let start = Instant::now();
    let producer = {
        let buffer = buffer.clone();
        tokio::spawn(async move {
            for scheduled in schedule {
                time::sleep_until(start + scheduled.arrival).await;
                if let Err(e) = buffer.put_rtp(&scheduled.buf, tick) {
                    warn!("failed to ingest packet: {}", e);
                }
            }
        })
    };

    let drain_ticks = (config.jitter.max_latency / tick) as u32
        + (config.simulation.base_delay_ms + config.simulation.jitter_ms) as u32 / tick as u32;
    let total_ticks = config.simulation.packets + drain_ticks + 1;
    let mut interval = time::interval(Duration::from_millis(tick as u64));
    for _ in 0..total_ticks {
        interval.tick().await;
        match buffer.get() {
            Playout::Packets(packets) => summary.delivered += packets.len(),
            Playout::Loss => summary.lost_ticks += 1,
            Playout::NotReady => summary.not_ready_ticks += 1,
        }
        if let Some(snapshot) = buffer.snapshot() {
            summary.max_latency_seen = summary.max_latency_seen.max(snapshot.latency);
            if cli.verbose {
                info!(
                    target_time = snapshot.target_time,
                    latency = snapshot.latency,
                    pending = snapshot.pending,
                    "tick"
                );
            }
        }
    }

    if let Err(e) = producer.await {
        warn!("producer task failed: {}", e);
    }
    summary.final_state = buffer.snapshot();
    info!(
        delivered = summary.delivered,
        lost_ticks = summary.lost_ticks,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
