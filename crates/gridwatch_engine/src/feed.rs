use std::sync::Arc;

use gridwatch_core::{EnergyUpdate, LinkView, WeatherUpdate};
use tokio::sync::watch;

use crate::broadcast::{Subscription, Topic, CONNECTION_STATUS, ENERGY_UPDATE, WEATHER_UPDATE};
use crate::demux::Demultiplexer;
use crate::reconnect::{ReconnectSettings, Reconnector};
use crate::transport::{Connector, WsConnector};

/// The live-update subsystem for one client session: one reconnecting
/// stream and the three topics it feeds.
///
/// Construct it once at startup, hand references to consumers, and call
/// [`LiveFeed::shutdown`] on exit.
pub struct LiveFeed {
    status: Topic<bool>,
    energy: Topic<EnergyUpdate>,
    weather: Topic<WeatherUpdate>,
    reconnector: Reconnector,
}

impl LiveFeed {
    /// Feed over a real WebSocket connection.
    pub fn new(settings: ReconnectSettings) -> Self {
        Self::with_connector(settings, Arc::new(WsConnector))
    }

    pub fn with_connector(settings: ReconnectSettings, connector: Arc<dyn Connector>) -> Self {
        let status = Topic::new(CONNECTION_STATUS);
        // Consumers can read "not connected" before the first attempt resolves.
        status.publish(false);
        let energy = Topic::new(ENERGY_UPDATE);
        let weather = Topic::new(WEATHER_UPDATE);

        let demux = Demultiplexer::new(energy.clone(), weather.clone());
        let reconnector = Reconnector::spawn(settings, connector, demux, status.clone());

        Self {
            status,
            energy,
            weather,
            reconnector,
        }
    }

    pub fn start(&self) {
        self.reconnector.start();
    }

    pub fn stop(&self) {
        self.reconnector.stop();
    }

    pub fn connection_status(&self) -> Subscription<bool> {
        self.status.subscribe()
    }

    pub fn energy_updates(&self) -> Subscription<EnergyUpdate> {
        self.energy.subscribe()
    }

    pub fn weather_updates(&self) -> Subscription<WeatherUpdate> {
        self.weather.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status.latest().unwrap_or(false)
    }

    pub fn link_view(&self) -> LinkView {
        self.reconnector.view()
    }

    pub fn watch_link(&self) -> watch::Receiver<LinkView> {
        self.reconnector.watch()
    }

    pub async fn shutdown(&self) {
        self.reconnector.shutdown().await;
    }
}
