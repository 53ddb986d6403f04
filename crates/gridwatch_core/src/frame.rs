//! Inbound stream frames and their classification into typed events.
//!
//! Frames arrive as `{"type": "<TAG>", "payload": {...}}`. Tags that are not
//! known to this build classify as [`Classified::Unknown`] so that newer
//! servers do not break older clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const ENERGY_UPDATE: &str = "ENERGY_UPDATE";
pub const WEATHER_UPDATE: &str = "WEATHER_UPDATE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub solar_generation: f64,
    pub wind_generation: f64,
    pub total_generation: f64,
    pub consumption: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub temperature: f64,
    pub wind_speed: f64,
    pub solar_irradiance: f64,
    pub cloud_cover: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Energy(EnergyUpdate),
    Weather(WeatherUpdate),
}

impl LiveEvent {
    /// Wire tag this event was decoded from.
    pub fn tag(&self) -> &'static str {
        match self {
            LiveEvent::Energy(_) => ENERGY_UPDATE,
            LiveEvent::Weather(_) => WEATHER_UPDATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Event(LiveEvent),
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not a valid envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("{tag} payload has an unexpected shape: {source}")]
    Payload {
        tag: &'static str,
        source: serde_json::Error,
    },
}

/// Untyped envelope as received on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundFrame {
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        serde_json::from_str(raw).map_err(FrameError::Envelope)
    }

    /// Decodes the payload according to the type tag.
    pub fn classify(self) -> Result<Classified, FrameError> {
        match self.kind.as_str() {
            ENERGY_UPDATE => decode(ENERGY_UPDATE, self.payload)
                .map(|update| Classified::Event(LiveEvent::Energy(update))),
            WEATHER_UPDATE => decode(WEATHER_UPDATE, self.payload)
                .map(|update| Classified::Event(LiveEvent::Weather(update))),
            _ => Ok(Classified::Unknown(self.kind)),
        }
    }
}

pub fn classify_frame(raw: &str) -> Result<Classified, FrameError> {
    InboundFrame::parse(raw)?.classify()
}

fn decode<T: serde::de::DeserializeOwned>(
    tag: &'static str,
    payload: Value,
) -> Result<T, FrameError> {
    serde_json::from_value(payload).map_err(|source| FrameError::Payload { tag, source })
}
