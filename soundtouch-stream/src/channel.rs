//! The live state channel
//!
//! [`LiveChannel`] owns at most one WebSocket connection at a time. Opening a
//! new connection first closes the previous one and waits for its reader task
//! to finish, so two connections never deliver events side by side.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        client::IntoClientRequest,
        protocol::{Message as WsMessage, WebSocketConfig},
    },
};
use tracing::{debug, info, trace, warn};

use crate::event::{ChannelEvent, ChannelSink, CloseReason, ConnectionId};
use crate::message::PushMessage;
use crate::{Result, StreamConfig};

/// Lifecycle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct ActiveConnection {
    id: ConnectionId,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
}

/// Receive-only channel reflecting the selected device's state
///
/// The channel never reconnects on its own: once a connection is lost it
/// stays closed until the owner calls [`LiveChannel::open`] again.
pub struct LiveChannel {
    config: StreamConfig,
    active: Option<ActiveConnection>,
    next_id: u64,
}

impl LiveChannel {
    /// Create a channel with the given configuration; nothing connects yet
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            active: None,
            next_id: 0,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open a new connection, closing the current one first
    ///
    /// Returns once the previous connection is fully torn down and the new
    /// one has started connecting. Events for the new connection, including
    /// a final [`ChannelEvent::ConnectionLost`], go to `sink`.
    pub async fn open<S: ChannelSink>(&mut self, sink: S) -> ConnectionId {
        self.close().await;

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        info!(connection = %id, endpoint = %self.config.endpoint, "Opening live channel");
        let task = tokio::spawn(run_connection(
            id,
            self.config.clone(),
            sink,
            state_tx,
            shutdown_rx,
        ));

        self.active = Some(ActiveConnection {
            id,
            shutdown: Some(shutdown_tx),
            task,
            state: state_rx,
        });
        id
    }

    /// Close the current connection, if any, and wait for it to finish
    pub async fn close(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        debug!(connection = %active.id, "Closing live channel");
        if let Some(shutdown) = active.shutdown.take() {
            // The task may already have exited on its own
            let _ = shutdown.send(());
        }

        match tokio::time::timeout(self.config.close_timeout, &mut active.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(connection = %active.id, error = %e, "Reader task failed"),
            Err(_) => {
                warn!(connection = %active.id, "Reader task did not stop in time, aborting");
                active.task.abort();
            }
        }
    }

    /// Id of the current connection, whatever its state
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// State of the current connection; `Closed` when there is none
    pub fn state(&self) -> ConnectionState {
        self.active
            .as_ref()
            .map(|a| *a.state.borrow())
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Watch the current connection's state transitions
    pub fn watch_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.active.as_ref().map(|a| a.state.clone())
    }

    /// Wait until the current connection reaches `state`, up to `timeout`
    pub async fn wait_for(&self, state: ConnectionState, timeout: Duration) -> bool {
        let Some(mut rx) = self.watch_state() else {
            return state == ConnectionState::Closed;
        };
        tokio::time::timeout(timeout, rx.wait_for(|s| *s == state))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }
}

async fn run_connection<S: ChannelSink>(
    id: ConnectionId,
    config: StreamConfig,
    sink: S,
    state: watch::Sender<ConnectionState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let reason = connect_and_read(id, &config, &sink, &state, &mut shutdown).await;

    state.send_replace(ConnectionState::Closed);
    if reason.is_unexpected() {
        warn!(connection = %id, %reason, "Live channel lost");
    } else {
        info!(connection = %id, "Live channel closed");
    }
    sink.deliver(ChannelEvent::ConnectionLost {
        connection: id,
        reason,
    });
}

async fn connect_and_read<S: ChannelSink>(
    id: ConnectionId,
    config: &StreamConfig,
    sink: &S,
    state: &watch::Sender<ConnectionState>,
    shutdown: &mut oneshot::Receiver<()>,
) -> CloseReason {
    let request = match config.endpoint.as_str().into_client_request() {
        Ok(request) => request,
        Err(e) => return CloseReason::ConnectFailed(format!("invalid endpoint: {e}")),
    };

    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.max_message_size);

    let connect = tokio::time::timeout(
        config.connect_timeout,
        connect_async_with_config(request, Some(ws_config), false),
    );
    let connected = tokio::select! {
        _ = &mut *shutdown => return CloseReason::Local,
        result = connect => result,
    };
    let ws = match connected {
        Ok(Ok((ws, response))) => {
            debug!(connection = %id, status = ?response.status(), "WebSocket connected");
            ws
        }
        Ok(Err(e)) => return CloseReason::ConnectFailed(e.to_string()),
        Err(_) => {
            return CloseReason::ConnectFailed(format!(
                "timed out after {:?}",
                config.connect_timeout
            ))
        }
    };

    state.send_replace(ConnectionState::Open);
    sink.deliver(ChannelEvent::Opened { connection: id });

    let (mut writer, mut reader) = ws.split();
    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                if let Err(e) = writer.close().await {
                    trace!(connection = %id, error = %e, "Close frame not sent");
                }
                return CloseReason::Local;
            }
            frame = reader.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => dispatch(id, &text, sink),
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.into_owned())
                        .filter(|r| !r.is_empty());
                    return CloseReason::Remote(reason);
                }
                Some(Ok(other)) => trace!(connection = %id, ?other, "Ignoring non-text frame"),
                Some(Err(e)) => return CloseReason::Error(e.to_string()),
                None => return CloseReason::Remote(None),
            }
        }
    }
}

fn dispatch<S: ChannelSink>(id: ConnectionId, text: &str, sink: &S) {
    debug!(connection = %id, "RX: {}", text);
    let message = match PushMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(connection = %id, error = %e, "Dropping malformed push frame");
            sink.deliver(ChannelEvent::ProtocolError {
                connection: id,
                error: e.to_string(),
            });
            return;
        }
    };

    match message {
        PushMessage::NowPlaying(state) => sink.deliver(ChannelEvent::Playback {
            connection: id,
            state,
        }),
        PushMessage::Volume(state) => sink.deliver(ChannelEvent::Volume {
            connection: id,
            state,
        }),
        PushMessage::Status(status) => {
            sink.deliver(ChannelEvent::Playback {
                connection: id,
                state: status.playback,
            });
            sink.deliver(ChannelEvent::Volume {
                connection: id,
                state: status.volume,
            });
        }
        PushMessage::Error(message) => sink.deliver(ChannelEvent::RemoteError {
            connection: id,
            message,
        }),
        PushMessage::Unrecognized(kind) => {
            trace!(connection = %id, ?kind, "Ignoring unrecognized push type")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_closed_without_connection() {
        let mut channel = tokio_test::assert_ok!(LiveChannel::new(StreamConfig::default()));
        assert_eq!(channel.state(), ConnectionState::Closed);
        assert_eq!(channel.connection_id(), None);
        channel.close().await;
        assert!(!channel.is_open());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StreamConfig::new().with_endpoint("http://localhost/ws");
        assert!(LiveChannel::new(config).is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_reports_connection_lost() {
        // Nothing listens on port 9 locally
        let config = StreamConfig::new().with_endpoint("ws://127.0.0.1:9/ws");
        let mut channel = LiveChannel::new(config).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = channel.open(tx).await;
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timeout waiting for event")
            .expect("sink closed");

        match event {
            ChannelEvent::ConnectionLost { connection, reason } => {
                assert_eq!(connection, id);
                assert!(matches!(reason, CloseReason::ConnectFailed(_)));
            }
            other => panic!("Expected ConnectionLost, got {other:?}"),
        }
        assert!(channel.wait_for(ConnectionState::Closed, Duration::from_secs(1)).await);
    }

    #[test]
    fn test_dispatch_expands_status_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(
            ConnectionId(3),
            r#"{"type":"status","artist":"A","track":"B","volume":9}"#,
            &tx,
        );

        assert!(matches!(rx.try_recv(), Ok(ChannelEvent::Playback { .. })));
        match rx.try_recv() {
            Ok(ChannelEvent::Volume { state, .. }) => assert_eq!(state.actual_volume, Some(9)),
            other => panic!("Expected Volume, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_ignores_unrecognized() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(ConnectionId(1), r#"{"type":"treble","level":2}"#, &tx);
        assert!(rx.try_recv().is_err());

        dispatch(ConnectionId(1), "{oops", &tx);
        assert!(matches!(
            rx.try_recv(),
            Ok(ChannelEvent::ProtocolError { .. })
        ));
    }
}
