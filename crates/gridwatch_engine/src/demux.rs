use gridwatch_core::{classify_frame, Classified, EnergyUpdate, LiveEvent, WeatherUpdate};
use gridwatch_logging::{gw_debug, gw_trace, gw_warn};

use crate::broadcast::Topic;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Published to the named topic.
    Published(&'static str),
    /// Well-formed frame with a type tag this build does not know.
    Unknown(String),
    /// Dropped because it could not be parsed or its payload did not match.
    Malformed,
}

/// Routes raw stream frames to the matching data topic.
#[derive(Debug, Clone)]
pub struct Demultiplexer {
    energy: Topic<EnergyUpdate>,
    weather: Topic<WeatherUpdate>,
}

impl Demultiplexer {
    pub fn new(energy: Topic<EnergyUpdate>, weather: Topic<WeatherUpdate>) -> Self {
        Self { energy, weather }
    }

    pub fn route(&self, raw: &str) -> RouteOutcome {
        match classify_frame(raw) {
            Ok(Classified::Event(event)) => self.dispatch(event),
            Ok(Classified::Unknown(tag)) => {
                gw_debug!("Ignoring frame with unknown type {}", tag);
                RouteOutcome::Unknown(tag)
            }
            Err(err) => {
                gw_warn!("Dropping malformed frame ({} bytes): {}", raw.len(), err);
                RouteOutcome::Malformed
            }
        }
    }

    pub fn dispatch(&self, event: LiveEvent) -> RouteOutcome {
        gw_trace!("Routing {} frame", event.tag());
        match event {
            LiveEvent::Energy(update) => {
                self.energy.publish(update);
                RouteOutcome::Published(self.energy.name())
            }
            LiveEvent::Weather(update) => {
                self.weather.publish(update);
                RouteOutcome::Published(self.weather.name())
            }
        }
    }
}
