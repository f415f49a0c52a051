// src/main.rs
mod config;
mod drivers;
mod engine;
mod types;
use anyhow::Result;
use log::{info, warn};
use crate::config::AppConfig;
// 入口函数: adc-sync [config.json]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {path}");
            AppConfig::load(&path)?
        }
        None => {
            info!("no configuration file given; using built-in defaults");
            AppConfig::default()
        }
    };
    let report = engine::run(&config)?;
    println!("{report}");
    if !report.completed {
        warn!("sample budget not reached; report is partial");
    }
    Ok(())
}
