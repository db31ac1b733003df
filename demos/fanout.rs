//! Fan-out demo
//!
//! Run with: cargo run --example fanout
//!
//! Starts a few subscribers of a `Frame` type (payloads are `bytes::Bytes`,
//! so every subscriber shares one allocation) and a `Shutdown` control
//! event, publishes a burst of frames, then closes the bus.
//!
//! Set `RUST_LOG=typebus=trace` to watch every publish.

use std::time::Duration;

use bytes::Bytes;
use typebus::{Bus, BusConfig};

#[derive(Debug, Clone)]
struct Frame {
    seq: u32,
    data: Bytes,
}

#[derive(Debug, Clone)]
struct Shutdown;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typebus=debug".parse()?)
                .add_directive("fanout=info".parse()?),
        )
        .init();

    let bus = Bus::with_config(BusConfig::default().subscriber_capacity(4));

    let mut workers = Vec::new();
    for (name, delay) in [("fast", 0u64), ("medium", 2), ("slow", 10)] {
        let mut frames = bus.subscribe::<Frame>().await?;
        let mut shutdown = bus.subscribe::<Shutdown>().await?;

        workers.push(tokio::spawn(async move {
            let mut received = 0usize;
            loop {
                tokio::select! {
                    frame = frames.recv() => match frame {
                        Some(frame) => {
                            received += frame.data.len();
                            tracing::debug!(subscriber = name, seq = frame.seq, "Frame received");
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                        }
                        None => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
            tracing::info!(subscriber = name, bytes = received, "Subscriber finished");
        }));
    }

    let payload = Bytes::from(vec![0u8; 1024]);
    for seq in 0..32 {
        bus.publish(Frame {
            seq,
            data: payload.clone(),
        })
        .await?;
    }
    tracing::info!("All frames published");
    bus.publish(Shutdown).await?;

    bus.close_all().await;
    for worker in workers {
        worker.await?;
    }

    Ok(())
}
