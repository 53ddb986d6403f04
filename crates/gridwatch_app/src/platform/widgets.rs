//! Console "widgets": independent consumers of the live feed topics that
//! render each update as a log line.

use gridwatch_core::{BatchProgress, CityEntity, EnergyUpdate, WeatherUpdate};
use gridwatch_engine::{BatchEvent, BatchReport, FetchOutcome, LiveFeed, Subscription};
use gridwatch_logging::{gw_info, gw_warn};
use tokio::task::JoinHandle;

pub struct Widgets {
    tasks: Vec<JoinHandle<()>>,
}

impl Widgets {
    /// Subscribes the status indicator and both panels to `feed`.
    pub fn spawn_all(feed: &LiveFeed) -> Self {
        let tasks = vec![
            tokio::spawn(status_indicator(feed.connection_status())),
            tokio::spawn(energy_panel(feed.energy_updates())),
            tokio::spawn(weather_panel(feed.weather_updates())),
        ];
        Self { tasks }
    }

    pub async fn shutdown(self) {
        for task in self.tasks {
            task.abort();
            let _ = task.await;
        }
    }
}

async fn status_indicator(mut status: Subscription<bool>) {
    let mut last = None;
    while let Some(connected) = status.recv().await {
        if last != Some(connected) {
            gw_info!("[status] {}", status_line(connected));
            last = Some(connected);
        }
    }
}

async fn energy_panel(mut updates: Subscription<EnergyUpdate>) {
    while let Some(update) = updates.recv().await {
        gw_info!("[energy] {}", energy_line(&update));
    }
}

async fn weather_panel(mut updates: Subscription<WeatherUpdate>) {
    while let Some(update) = updates.recv().await {
        gw_info!("[weather] {}", weather_line(&update));
    }
}

pub fn log_batch_event(event: &BatchEvent) {
    match event {
        BatchEvent::CitySettled {
            city,
            outcome,
            progress,
            ..
        } => match outcome {
            Ok(_) => gw_info!("[map] {}", city_line(city, outcome, progress)),
            Err(_) => gw_warn!("[map] {}", city_line(city, outcome, progress)),
        },
        BatchEvent::Completed(progress) => {
            gw_info!(
                "[map] Loaded {} of {} cities ({} failed)",
                progress.succeeded,
                progress.total,
                progress.failed
            );
        }
        BatchEvent::Cancelled(progress) => {
            gw_info!(
                "[map] Load cancelled at {}/{}",
                progress.processed,
                progress.total
            );
        }
    }
}

pub fn log_batch_report(report: &BatchReport) {
    let coldest = report
        .succeeded()
        .min_by(|(_, a), (_, b)| a.temperature.total_cmp(&b.temperature));
    let warmest = report
        .succeeded()
        .max_by(|(_, a), (_, b)| a.temperature.total_cmp(&b.temperature));
    if let (Some((cold, cold_record)), Some((warm, warm_record))) = (coldest, warmest) {
        gw_info!(
            "[map] Coldest {} at {}°F, warmest {} at {}°F",
            cold.label(),
            cold_record.temperature_f(),
            warm.label(),
            warm_record.temperature_f()
        );
    }
}

fn status_line(connected: bool) -> &'static str {
    if connected {
        "Live feed connected"
    } else {
        "Live feed disconnected"
    }
}

fn energy_line(update: &EnergyUpdate) -> String {
    format!(
        "solar {:.1} MW, wind {:.1} MW, total {:.1} MW, consumption {:.1} MW, efficiency {:.1}%",
        update.solar_generation,
        update.wind_generation,
        update.total_generation,
        update.consumption,
        update.efficiency
    )
}

fn weather_line(update: &WeatherUpdate) -> String {
    format!(
        "{:.1}°C, wind {:.1} m/s, irradiance {:.0} W/m², cloud cover {:.0}%",
        update.temperature, update.wind_speed, update.solar_irradiance, update.cloud_cover
    )
}

fn city_line(city: &CityEntity, outcome: &FetchOutcome, progress: &BatchProgress) -> String {
    let detail = match outcome {
        Ok(record) => format!(
            "{}°F, {}, wind {}",
            record.temperature_f(),
            record.description,
            record.wind_summary()
        ),
        Err(kind) => format!("unavailable ({kind})"),
    };
    format!(
        "{} {} ({}/{})",
        city.label(),
        detail,
        progress.processed,
        progress.total
    )
}
