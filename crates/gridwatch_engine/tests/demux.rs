use gridwatch_core::{EnergyUpdate, WeatherUpdate};
use gridwatch_engine::{Demultiplexer, RouteOutcome, Topic, ENERGY_UPDATE, WEATHER_UPDATE};
use pretty_assertions::assert_eq;

fn topics() -> (Topic<EnergyUpdate>, Topic<WeatherUpdate>, Demultiplexer) {
    gridwatch_logging::initialize_for_tests();
    let energy = Topic::new(ENERGY_UPDATE);
    let weather = Topic::new(WEATHER_UPDATE);
    let demux = Demultiplexer::new(energy.clone(), weather.clone());
    (energy, weather, demux)
}

const ENERGY_FRAME: &str = r#"{"type":"ENERGY_UPDATE","payload":{"solarGeneration":40.0,"windGeneration":60.0,"totalGeneration":100.0,"consumption":150.0,"efficiency":66.67}}"#;
const WEATHER_FRAME: &str = r#"{"type":"WEATHER_UPDATE","payload":{"temperature":21.5,"windSpeed":8.1,"solarIrradiance":420.0,"cloudCover":55.0}}"#;

#[test]
fn energy_frame_reaches_only_the_energy_topic() {
    let (energy, weather, demux) = topics();
    let mut energy_sub = energy.subscribe();
    let mut weather_sub = weather.subscribe();

    assert_eq!(demux.route(ENERGY_FRAME), RouteOutcome::Published(ENERGY_UPDATE));

    let update = energy_sub.try_recv().expect("energy update");
    assert_eq!(update.total_generation, 100.0);
    assert_eq!(weather_sub.try_recv(), None);
}

#[test]
fn weather_frame_reaches_only_the_weather_topic() {
    let (energy, weather, demux) = topics();

    assert_eq!(demux.route(WEATHER_FRAME), RouteOutcome::Published(WEATHER_UPDATE));
    assert_eq!(weather.latest().map(|w| w.temperature), Some(21.5));
    assert_eq!(energy.latest(), None);
}

#[test]
fn unknown_type_publishes_nothing() {
    let (energy, weather, demux) = topics();

    let outcome = demux.route(r#"{"type":"UNKNOWN_TYPE","payload":{"total":1}}"#);
    assert_eq!(outcome, RouteOutcome::Unknown("UNKNOWN_TYPE".to_string()));
    assert_eq!(energy.latest(), None);
    assert_eq!(weather.latest(), None);
}

#[test]
fn malformed_frames_are_dropped_and_routing_continues() {
    let (energy, _weather, demux) = topics();
    let mut sub = energy.subscribe();

    assert_eq!(demux.route("{\"type\":"), RouteOutcome::Malformed);
    assert_eq!(demux.route("[]"), RouteOutcome::Malformed);
    assert_eq!(
        demux.route(r#"{"type":"ENERGY_UPDATE","payload":{"total":100}}"#),
        RouteOutcome::Malformed
    );
    assert_eq!(sub.try_recv(), None);

    assert_eq!(demux.route(ENERGY_FRAME), RouteOutcome::Published(ENERGY_UPDATE));
    assert!(sub.try_recv().is_some());
}
