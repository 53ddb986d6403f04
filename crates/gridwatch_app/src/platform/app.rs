use std::sync::Arc;

use anyhow::Context;
use gridwatch_core::reference_cities;
use gridwatch_engine::{LiveConfig, LiveFeed, ReqwestWeatherLookup, WeatherLoader};
use gridwatch_logging::{gw_info, parse_level};
use log::LevelFilter;

use super::logging::{self, LogDestination};
use super::widgets::{self, Widgets};

const ENV_LOG: &str = "GRIDWATCH_LOG";
const ENV_LOG_DEST: &str = "GRIDWATCH_LOG_DEST";

pub fn run_app() -> anyhow::Result<()> {
    let level = std::env::var(ENV_LOG)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::Info);
    let destination = std::env::var(ENV_LOG_DEST)
        .ok()
        .and_then(|value| LogDestination::parse(&value))
        .unwrap_or(LogDestination::Both);
    logging::initialize(destination, level);

    let config = LiveConfig::from_env().context("invalid configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: LiveConfig) -> anyhow::Result<()> {
    gw_info!(
        "Streaming from {}, weather from {}",
        config.stream_url,
        config.api_base_url
    );

    let feed = LiveFeed::new(config.reconnect_settings());
    let widgets = Widgets::spawn_all(&feed);
    feed.start();

    let lookup = ReqwestWeatherLookup::new(config.fetch_settings())
        .context("failed to build the weather client")?;
    let loader = WeatherLoader::new(Arc::new(lookup), config.batch_settings());
    let mut session = loader.begin(reference_cities().to_vec());
    let mut loading = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.context("failed to listen for Ctrl-C")?;
                gw_info!("Shutting down");
                break;
            }
            event = session.next_event(), if loading => match event {
                Some(event) => widgets::log_batch_event(&event),
                None => {
                    loading = false;
                    let report = session.finish().await;
                    widgets::log_batch_report(&report);
                }
            },
        }
    }

    loader.cancel();
    feed.stop();
    feed.shutdown().await;
    widgets.shutdown().await;
    Ok(())
}
