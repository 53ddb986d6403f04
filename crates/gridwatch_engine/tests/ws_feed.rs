use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridwatch_core::ReconnectPolicy;
use gridwatch_engine::{Connector, LiveFeed, ReconnectSettings, TransportError, WsConnector};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::error::UrlError;
use tokio_tungstenite::tungstenite::{self, Message};

const FRAMES: [&str; 4] = [
    r#"{"type":"ENERGY_UPDATE","payload":{"timestamp":"2024-05-01T12:00:00","solarGeneration":41.5,"windGeneration":58.5,"totalGeneration":100.0,"consumption":140.0,"efficiency":71.43}}"#,
    "this is not json",
    r#"{"type":"UNKNOWN_TYPE","payload":{"total":100}}"#,
    r#"{"type":"WEATHER_UPDATE","payload":{"temperature":18.0,"windSpeed":6.5,"solarIrradiance":510.0,"cloudCover":20.0}}"#,
];

/// Serves one client: sends the fixture frames, then keeps the socket open
/// until the client goes away.
async fn serve_once(listener: TcpListener) {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut socket = accept_async(tcp).await.unwrap();
    for frame in FRAMES {
        socket.send(Message::text(frame)).await.unwrap();
    }
    while let Some(Ok(_)) = socket.next().await {}
}

#[tokio::test]
async fn websocket_frames_are_routed_to_their_topics() {
    gridwatch_logging::initialize_for_tests();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener));

    let feed = LiveFeed::new(ReconnectSettings {
        url: format!("ws://{addr}/ws/energy-data"),
        policy: ReconnectPolicy::new(0, Duration::from_millis(100)),
        connect_timeout: Duration::from_secs(5),
    });
    let mut energy = feed.energy_updates();
    let mut weather = feed.weather_updates();
    let mut status = feed.connection_status();

    feed.start();

    let within = Duration::from_secs(5);
    assert_eq!(tokio::time::timeout(within, status.recv()).await.unwrap(), Some(false));
    assert_eq!(tokio::time::timeout(within, status.recv()).await.unwrap(), Some(true));

    let energy_update = tokio::time::timeout(within, energy.recv())
        .await
        .unwrap()
        .expect("energy update");
    assert_eq!(energy_update.total_generation, 100.0);
    assert_eq!(energy_update.timestamp.as_deref(), Some("2024-05-01T12:00:00"));

    // The bad and unknown frames in between did not end the stream.
    let weather_update = tokio::time::timeout(within, weather.recv())
        .await
        .unwrap()
        .expect("weather update");
    assert_eq!(weather_update.cloud_cover, 20.0);
    assert!(feed.is_connected());

    feed.stop();
    assert_eq!(tokio::time::timeout(within, status.recv()).await.unwrap(), Some(false));
    feed.shutdown().await;
    tokio::time::timeout(within, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn unreachable_server_reports_disconnected() {
    gridwatch_logging::initialize_for_tests();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let feed = LiveFeed::new(ReconnectSettings {
        url: format!("ws://{addr}/ws/energy-data"),
        policy: ReconnectPolicy::new(1, Duration::from_millis(50)),
        connect_timeout: Duration::from_secs(2),
    });
    let mut link = feed.watch_link();
    feed.start();

    tokio::time::timeout(Duration::from_secs(5), link.wait_for(|view| view.exhausted))
        .await
        .unwrap()
        .unwrap();
    assert!(!feed.is_connected());
    feed.shutdown().await;
}

#[tokio::test]
async fn secure_urls_go_through_a_tls_handshake() {
    gridwatch_logging::initialize_for_tests();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // A plain TCP peer that hangs up, so the handshake cannot succeed.
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        drop(tcp);
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        WsConnector.connect(&format!("wss://{addr}/ws/energy-data")),
    )
    .await
    .unwrap()
    .err()
    .expect("handshake with a plain TCP peer fails");
    assert!(
        !matches!(
            err,
            TransportError::WebSocket(tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled))
        ),
        "wss is not supported: {err:?}"
    );
    server.await.unwrap();
}
