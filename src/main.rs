use anyhow::Result;
use log::info;

use myo_rs::config::MyoConfig;
use myo_rs::handlers::HandlerTable;
use myo_rs::myo_client::BtleRadio;
use myo_rs::router::NotificationRouter;
use myo_rs::sink::LogSink;
use myo_rs::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=myo_rs=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = MyoConfig::default();

    // ── Handlers ──────────────────────────────────────────────────────────────
    let mut handlers = HandlerTable::new();
    handlers.on_emg(|source, channels| {
        println!("[EMG] {source}  {channels:?}");
    });
    handlers.on_imu(|_, _, _, _| {});

    // ── Run ───────────────────────────────────────────────────────────────────
    // EMG samples go to the log sink at debug level; point RUST_LOG at
    // `myo_rs::sink` to see them.
    let router = NotificationRouter::new(handlers, LogSink);
    let mut supervisor = Supervisor::new(BtleRadio::new(&config), config, router);

    info!("Press Ctrl-C to quit.");
    supervisor
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    let counts = supervisor.router().counts();
    info!(
        "Routed {} IMU and {} EMG notifications ({} malformed).",
        counts.imu, counts.emg, counts.malformed
    );
    Ok(())
}
