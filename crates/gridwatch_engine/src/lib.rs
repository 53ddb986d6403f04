//! Gridwatch engine: live feed IO, topic fan-out and weather batch loading.
mod batch;
mod broadcast;
mod config;
mod demux;
mod feed;
mod fetch;
mod reconnect;
mod transport;
mod types;

pub use batch::{
    BatchFetcher, BatchSettings, ChannelProgressSink, LoadSession, ProgressSink, WeatherLoader,
};
pub use broadcast::{Subscription, Topic, CONNECTION_STATUS, ENERGY_UPDATE, WEATHER_UPDATE};
pub use config::{
    ConfigError, LiveConfig, ENV_API_TOKEN, ENV_API_URL, ENV_CONNECT_TIMEOUT_MS,
    ENV_FETCH_TIMEOUT_MS, ENV_GROUP_PAUSE_MS, ENV_GROUP_SIZE, ENV_MAX_ATTEMPTS,
    ENV_RETRY_INTERVAL_MS, ENV_STREAM_URL,
};
pub use demux::{Demultiplexer, RouteOutcome};
pub use feed::LiveFeed;
pub use fetch::{FetchSettings, ReqwestWeatherLookup, WeatherLookup};
pub use reconnect::{ReconnectSettings, Reconnector};
pub use transport::{Connector, FrameStream, TransportError, WsConnector};
pub use types::{BatchEvent, BatchReport, CityResult, FailureKind, FetchError, FetchOutcome};
