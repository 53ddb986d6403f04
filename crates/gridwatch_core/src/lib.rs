//! Gridwatch core: pure link state machine, frame classification and
//! reference data. Nothing in this crate performs IO.
mod city;
mod effect;
mod frame;
mod msg;
mod state;
mod update;
mod view_model;
mod weather;

pub use city::{reference_cities, CityEntity};
pub use effect::Effect;
pub use frame::{
    classify_frame, Classified, EnergyUpdate, FrameError, InboundFrame, LiveEvent, WeatherUpdate,
    ENERGY_UPDATE, WEATHER_UPDATE,
};
pub use msg::Msg;
pub use state::{ConnectionState, LinkState, ReconnectPolicy};
pub use update::update;
pub use view_model::{BatchProgress, LinkView};
pub use weather::{
    celsius_to_fahrenheit, compass_direction, hpa_to_inhg, meters_to_miles, mps_to_mph,
    WeatherRecord,
};
