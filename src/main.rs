// src/main.rs
mod config;
mod dispatch;
mod event;
mod gate;
mod geoip;
mod line;
mod notify;
mod processor;

use std::{
    io,
    path::Path,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};
use chrono::Local;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use config::Config;
use gate::ReplayGate;
use geoip::GeoIpLookup;
use notify::TelegramNotifier;
use processor::{follow_log, stop_on_signals, Pipeline};

pub const AUTH_LOG: &str      = "/var/log/auth.log";
pub const TELEGRAM_API: &str  = "https://api.telegram.org";
pub const GEOIP_PROGRAM: &str = "geoiplookup";

pub const ENV_CHAT: &str  = "TELEGRAM_CHAT";
pub const ENV_TOKEN: &str = "TELEGRAM_TOKEN";

const SEND_TIMEOUT: Duration  = Duration::from_secs(15);
const GEOIP_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env();
    if !cfg.notifications_enabled() {
        warn!("{} or {} not set, notifications disabled", ENV_CHAT, ENV_TOKEN);
    }

    // Records at or before this second are history, not news.
    let start = Local::now().naive_local();

    let lines = follow_log(Path::new(AUTH_LOG)).map_err(|e| {
        eprintln!("Failed to follow {}: {}", AUTH_LOG, e);
        e
    })?;

    let shutdown = Arc::new(AtomicBool::new(false));
    stop_on_signals(&[SIGINT, SIGTERM], lines.stopper(), Arc::clone(&shutdown))?;

    info!("watching {}", AUTH_LOG);
    let mut pipeline = Pipeline::new(
        ReplayGate::new(start),
        GeoIpLookup::new(GEOIP_TIMEOUT),
        TelegramNotifier::from_config(&cfg, SEND_TIMEOUT),
    );
    pipeline.run(lines, &shutdown)
}
