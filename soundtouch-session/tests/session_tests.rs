//! Session coordinator tests against a mockito HTTP backend and a local
//! WebSocket server.


use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;
use soundtouch_api::ClientConfig;
use soundtouch_session::{
    CloseReason, ConnectionState, SessionConfig, SessionCoordinator, SessionError,
};
use soundtouch_stream::StreamConfig;
use test_helpers::{session_config, Observed, RecordingObserver, TestServer, WAIT};

async fn mock_status(server: &mut ServerGuard, body: serde_json::Value) -> Mock {
    server
        .mock("GET", "/api/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn mock_select(server: &mut ServerGuard, hostname: &str, status: usize) -> Mock {
    server
        .mock("POST", "/api/select_device")
        .match_body(Matcher::Json(json!({ "url": hostname })))
        .with_status(status)
        .create_async()
        .await
}

async fn start_session(
    server: &ServerGuard,
    ws: &TestServer,
) -> (SessionCoordinator, Arc<RecordingObserver>) {
    let observer = RecordingObserver::new();
    let session = SessionCoordinator::new(session_config(&server.url(), ws), observer.clone())
        .expect("valid test config");
    (session, observer)
}

/// Select `hostname` and wait until its poll finished and its channel is up
async fn select_and_settle(session: &mut SessionCoordinator, ws: &TestServer, hostname: &str) {
    session.select_device(hostname).await.unwrap();
    session.settle().await;
    assert!(session.wait_for_channel(ConnectionState::Open, WAIT).await);
    assert!(ws.wait_until(WAIT, |s| s.open_connections() == 1).await);
}

#[tokio::test]
async fn test_discover_selects_first_device_and_polls() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    server
        .mock("GET", "/api/discover")
        .with_status(200)
        .with_body(
            json!([
                {"hostname": "living-room", "realname": "Living Room", "ip": "10.0.0.2", "port": 8090},
                {"hostname": "kitchen", "realname": "Kitchen", "ip": "10.0.0.3", "port": 8090}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let select = mock_select(&mut server, "living-room", 200).await;
    mock_status(&mut server, json!({"now_playing": {"artist": "A", "track": "B"}})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    let devices = session.discover().await.unwrap();
    session.settle().await;

    assert_eq!(devices.len(), 2);
    assert_eq!(session.devices().len(), 2);
    assert_eq!(session.selected_hostname().as_deref(), Some("living-room"));
    assert_eq!(
        session.playback().map(|p| p.to_string()).as_deref(),
        Some("A - B")
    );
    assert_eq!(observer.last_playback().as_deref(), Some("A - B"));
    assert_eq!(
        observer.last_volume(),
        Some(("Unknown".to_string(), 20))
    );
    assert_eq!(
        observer.notifications(),
        vec![
            ("Selected device: living-room".to_string(), false),
            ("2 device(s) found".to_string(), false),
        ]
    );
    assert!(observer.events().contains(&Observed::Devices(vec![
        "Living Room living-room (10.0.0.2:8090)".to_string(),
        "Kitchen kitchen (10.0.0.3:8090)".to_string(),
    ])));

    select.assert_async().await;
    assert!(ws.wait_until(WAIT, |s| s.open_connections() == 1).await);
}

#[tokio::test]
async fn test_discover_with_no_devices() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    server
        .mock("GET", "/api/discover")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let select = server
        .mock("POST", "/api/select_device")
        .expect(0)
        .create_async()
        .await;

    let (mut session, observer) = start_session(&server, &ws).await;
    let error = session.discover().await.unwrap_err();

    assert!(matches!(error, SessionError::NoDevicesFound));
    assert!(session.selection().is_none());
    assert_eq!(observer.errors(), vec!["No devices found".to_string()]);
    assert!(observer.events().contains(&Observed::Devices(vec![])));
    select.assert_async().await;
}

#[tokio::test]
async fn test_volume_push_drives_display_and_slider() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;

    ws.push(r#"{"type":"volume","volume":42}"#);
    assert!(
        observer
            .wait_until(WAIT, |events| events.contains(&Observed::Volume {
                display: "42".to_string(),
                slider: 42
            }))
            .await
    );
    assert_eq!(session.volume().and_then(|v| v.actual_volume), Some(42));

    ws.push(r#"{"type":"now_playing","artist":"Nina Simone","track":""}"#);
    assert!(
        observer
            .wait_until(WAIT, |events| events
                .contains(&Observed::Playback("Nina Simone - Unknown".to_string())))
            .await
    );
}

#[tokio::test]
async fn test_failed_selection_changes_nothing() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "den", 500).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    let error = session.select_device("den").await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert!(session.selection().is_none());
    assert_eq!(session.channel_state(), ConnectionState::Closed);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ws.accepted_connections(), 0);

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to select device"));
    assert_eq!(observer.notifications().len(), 1);
}

#[tokio::test]
async fn test_failed_reselection_keeps_previous_device() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_select(&mut server, "den", 500).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;
    let before = session.selection();
    observer.clear();

    assert!(session.select_device("den").await.is_err());

    assert_eq!(session.selection(), before);
    assert!(session.wait_for_channel(ConnectionState::Open, WAIT).await);
    assert_eq!(ws.accepted_connections(), 1);
    assert_eq!(observer.notifications().len(), 1);
}

#[tokio::test]
async fn test_empty_hostname_is_rejected_locally() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    let select = server
        .mock("POST", "/api/select_device")
        .expect(0)
        .create_async()
        .await;

    let (mut session, observer) = start_session(&server, &ws).await;
    let error = session.select_device("   ").await.unwrap_err();

    assert!(error.is_validation());
    assert_eq!(observer.errors(), vec!["Please enter a hostname".to_string()]);
    select.assert_async().await;
}

#[tokio::test]
async fn test_unexpected_close_is_reported_without_reopen() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;
    observer.clear();

    ws.drop_all();
    assert!(
        observer
            .wait_until(WAIT, |events| events
                .iter()
                .any(|e| matches!(e, Observed::ConnectionLost(reason) if reason.is_unexpected())))
            .await
    );
    assert!(session.wait_for_channel(ConnectionState::Closed, WAIT).await);

    let errors = observer.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("WebSocket connection closed"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ws.accepted_connections(), 1, "channel must not reopen on its own");

    // The next selection opens a fresh connection
    session.select_device("kitchen").await.unwrap();
    assert!(ws.wait_until(WAIT, |s| s.accepted_connections() == 2).await);
}

#[tokio::test]
async fn test_reselecting_converges_on_one_connection() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    server
        .mock("POST", "/api/select_device")
        .with_status(200)
        .create_async()
        .await;
    mock_status(&mut server, json!({"volume": {"actual_volume": 10}})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    for hostname in ["kitchen", "den", "kitchen", "studio"] {
        session.select_device(hostname).await.unwrap();
    }
    session.settle().await;

    assert_eq!(session.selected_hostname().as_deref(), Some("studio"));
    assert_eq!(session.selection().map(|t| t.generation()), Some(4));
    assert!(session.wait_for_channel(ConnectionState::Open, WAIT).await);
    assert!(
        ws.wait_until(WAIT, |s| s.open_connections() == 1).await,
        "expected one open connection, got {}",
        ws.open_connections()
    );

    // Superseded connections closing is not an error the user hears about
    assert!(observer.errors().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    observer.clear();
    ws.push(r#"{"type":"volume","actual_volume":55}"#);
    assert!(
        observer
            .wait_until(WAIT, |events| !events.is_empty())
            .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        observer.events(),
        vec![Observed::Volume {
            display: "55".to_string(),
            slider: 55
        }]
    );
}

#[tokio::test]
async fn test_channel_errors_are_notified() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;
    observer.clear();

    ws.push(r#"{"error":"Device unreachable"}"#);
    ws.push("not json");
    ws.push(r#"{"type":"treble","level":3}"#);
    assert!(
        observer
            .wait_until(WAIT, |events| events.len() >= 2)
            .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    let errors = observer.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "Device unreachable");
    assert!(errors[1].starts_with("Protocol error"));
    assert_eq!(session.channel_state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_manual_hostname_appends_entries() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "studio", 200).await;
    mock_select(&mut server, "attic", 503).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    session.set_manual_hostname("studio").await.unwrap();
    session.set_manual_hostname(" studio ").await.unwrap();
    session.settle().await;

    let labels: Vec<String> = session.devices().iter().map(|d| d.label()).collect();
    assert_eq!(labels, vec!["studio (Manual)", "studio (Manual)"]);
    assert!(session.devices().iter().all(|d| d.is_manual()));

    let error = session.set_manual_hostname("attic").await.unwrap_err();
    assert!(error.to_string().starts_with("Failed to set manual hostname"));
    assert_eq!(session.devices().len(), 2);
    assert_eq!(session.selected_hostname().as_deref(), Some("studio"));

    let notifications = observer.notifications();
    assert_eq!(
        notifications,
        vec![
            ("Set manual hostname: studio".to_string(), false),
            ("Set manual hostname: studio".to_string(), false),
            (error.to_string(), true),
        ]
    );
}

#[tokio::test]
async fn test_set_volume_is_published_before_the_request() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    let mock = server
        .mock("POST", "/api/volume")
        .match_body(Matcher::Json(json!({ "url": "35" })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (session, observer) = start_session(&server, &ws).await;
    session.set_volume("35").await.unwrap();
    assert!(session.set_volume("101").await.is_err());

    assert_eq!(
        observer.events(),
        vec![
            Observed::VolumeRequested(35),
            Observed::Notify {
                message: "Volume set to 35".to_string(),
                is_error: false
            },
            Observed::Notify {
                message: "Volume must be 0-100".to_string(),
                is_error: true
            },
        ]
    );
    mock.assert_async().await;
}

#[rstest]
#[case("/api/preset", "3", 200, "Playing Preset 3", false)]
#[case("/api/preset", "3", 500, "Failed to play preset or no device selected", true)]
#[case("/api/radio", "http://stream.example.com/live", 200, "Playing radio stream", false)]
#[case("/api/youtube", "https://www.youtube.com/watch?v=abc", 200, "Playing YouTube audio", false)]
#[case("/api/play", "PAUSE", 200, "PAUSE successful", false)]
#[case("/api/play", "PAUSE", 500, "Failed to pause or no device selected", true)]
#[tokio::test]
async fn test_command_outcome_is_notified_once(
    #[case] path: &str,
    #[case] value: &str,
    #[case] status: usize,
    #[case] expected: &str,
    #[case] is_error: bool,
) {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    server
        .mock("POST", path)
        .match_body(Matcher::Json(json!({ "url": value })))
        .with_status(status)
        .create_async()
        .await;

    let (session, observer) = start_session(&server, &ws).await;
    let result = match path {
        "/api/preset" => session.play_preset(value).await.map(|_| ()),
        "/api/radio" => session.play_radio_url(value).await.map(|_| ()),
        "/api/youtube" => session.play_youtube_url(value).await.map(|_| ()),
        _ => session.play_transport_action(value).await.map(|_| ()),
    };

    assert_eq!(result.is_err(), is_error);
    let notifications = observer.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].0.starts_with(expected));
    assert_eq!(notifications[0].1, is_error);
}

#[tokio::test]
async fn test_refresh_status_after_push() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_status(&mut server, json!({"artist": "A", "track": "B", "volume": 12})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;
    assert_eq!(observer.last_volume(), Some(("12".to_string(), 12)));

    ws.push(r#"{"type":"volume","volume":30}"#);
    assert!(
        observer
            .wait_until(WAIT, |events| events.contains(&Observed::Volume {
                display: "30".to_string(),
                slider: 30
            }))
            .await
    );

    // An explicit refresh issued after the push is newer and wins
    session.refresh_status().await.unwrap();
    assert_eq!(session.volume().and_then(|v| v.actual_volume), Some(12));
}

#[tokio::test]
async fn test_shutdown_is_silent() {
    let mut server = Server::new_async().await;
    let ws = TestServer::start().await;
    mock_select(&mut server, "kitchen", 200).await;
    mock_status(&mut server, json!({})).await;

    let (mut session, observer) = start_session(&server, &ws).await;
    select_and_settle(&mut session, &ws, "kitchen").await;
    observer.clear();

    session.shutdown().await;
    assert_eq!(session.channel_state(), ConnectionState::Closed);
    assert!(ws.wait_until(WAIT, |s| s.open_connections() == 0).await);
    assert!(!observer
        .events()
        .iter()
        .any(|e| matches!(e, Observed::ConnectionLost(CloseReason::Local))));
    assert!(observer.errors().is_empty());
}

fn offline_config(http_url: &str) -> SessionConfig {
    SessionConfig::new()
        .with_client(ClientConfig::new().with_base_url(http_url))
        .with_stream(StreamConfig::new().with_endpoint("ws://127.0.0.1:9/ws"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every volume input yields exactly one notification, and a request
    /// only for integers in range
    #[test]
    fn prop_volume_notifies_exactly_once(input in "-?[0-9]{1,3}|[a-z ]{0,3}") {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut server = Server::new_async().await;
            let valid = input.trim().parse::<i64>().map_or(false, |v| (0..=100).contains(&v));
            let mock = server
                .mock("POST", "/api/volume")
                .with_status(200)
                .expect(usize::from(valid))
                .create_async()
                .await;

            let observer = RecordingObserver::new();
            let session = SessionCoordinator::new(offline_config(&server.url()), observer.clone())
                .unwrap();
            let result = session.set_volume(&input).await;

            assert_eq!(result.is_ok(), valid);
            assert_eq!(observer.notifications().len(), 1);
            let requested = observer
                .events()
                .iter()
                .any(|e| matches!(e, Observed::VolumeRequested(_)));
            assert_eq!(requested, valid);
            mock.assert_async().await;
        });
    }
}
