//! The session coordinator
//!
//! Owns the selected device, the live channel bound to it and the merged
//! now-playing/volume state. Every user action ends in exactly one call to
//! [`SessionObserver::notify`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use soundtouch_api::{
    Command, CommandClient, DeviceDescriptor, Hostname, PlaybackState, Preset, RadioUrl,
    StatusSnapshot, TransportAction, ValidationError, Volume, VolumeState, YouTubeUrl,
};
use soundtouch_stream::{ChannelEvent, ChannelSink, ConnectionState, LiveChannel};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::{PollOutcome, PollTicket, SelectionTag, SessionState};
use crate::{Result, SessionConfig, SessionError, SessionObserver};

const MANUAL_FAILURE_MESSAGE: &str = "Failed to set manual hostname";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionKind {
    Picked,
    Manual,
}

/// State shared between the coordinator, its polls and its channel sink
struct Shared {
    state: Mutex<SessionState>,
    observer: Arc<dyn SessionObserver>,
}

impl Shared {
    fn notify_error(&self, error: &SessionError) {
        self.observer.notify(&error.to_string(), true);
    }

    fn is_current(&self, tag: &SelectionTag) -> bool {
        self.state.lock().is_current(tag)
    }

    fn apply_poll(&self, ticket: &PollTicket, snapshot: StatusSnapshot) {
        let playback = snapshot.playback.clone();
        let volume = snapshot.volume;

        let mut state = self.state.lock();
        match state.apply_poll(ticket, snapshot) {
            PollOutcome::Stale => {
                warn!(selection = %ticket.tag(), "Discarding status poll for superseded selection");
            }
            PollOutcome::Applied {
                playback: playback_written,
                volume: volume_written,
            } => {
                if playback_written {
                    self.observer.playback_changed(&playback);
                } else {
                    debug!(selection = %ticket.tag(), "Poll playback superseded by push");
                }
                if volume_written {
                    self.observer.volume_changed(&volume);
                } else {
                    debug!(selection = %ticket.tag(), "Poll volume superseded by push");
                }
            }
        }
    }
}

/// Channel sink bound to one selection
struct SelectionSink {
    tag: SelectionTag,
    shared: Arc<Shared>,
}

impl ChannelSink for SelectionSink {
    fn deliver(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened { connection } => {
                info!(selection = %self.tag, %connection, "Live channel open");
            }
            ChannelEvent::Playback { state: playback, .. } => {
                let mut state = self.shared.state.lock();
                if state.apply_playback(&self.tag, playback.clone()) {
                    self.shared.observer.playback_changed(&playback);
                } else {
                    debug!(selection = %self.tag, "Dropping playback push for superseded selection");
                }
            }
            ChannelEvent::Volume { state: volume, .. } => {
                let mut state = self.shared.state.lock();
                if state.apply_volume(&self.tag, volume) {
                    self.shared.observer.volume_changed(&volume);
                } else {
                    debug!(selection = %self.tag, "Dropping volume push for superseded selection");
                }
            }
            ChannelEvent::RemoteError { message, .. } => {
                if self.shared.is_current(&self.tag) {
                    self.shared.observer.notify(&message, true);
                }
            }
            ChannelEvent::ProtocolError { error, .. } => {
                if self.shared.is_current(&self.tag) {
                    self.shared.notify_error(&SessionError::Protocol(error));
                }
            }
            ChannelEvent::ConnectionLost { connection, reason } => {
                if !self.shared.is_current(&self.tag) {
                    debug!(selection = %self.tag, %connection, "Superseded connection closed");
                    return;
                }
                warn!(selection = %self.tag, %connection, %reason, "Live channel lost");
                self.shared
                    .notify_error(&SessionError::ChannelClosed(reason.clone()));
                self.shared.observer.connection_lost(&reason);
            }
        }
    }
}

/// Drives device selection, commands and live state for one user session
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use soundtouch_session::{NullObserver, SessionConfig, SessionCoordinator};
///
/// let config = SessionConfig::from_base_url("http://localhost:3000")?;
/// let mut session = SessionCoordinator::new(config, Arc::new(NullObserver))?;
/// session.discover().await?;
/// session.play_preset("1").await?;
/// ```
pub struct SessionCoordinator {
    client: CommandClient,
    channel: LiveChannel,
    shared: Arc<Shared>,
    devices: Vec<DeviceDescriptor>,
    polls: Vec<JoinHandle<()>>,
}

impl SessionCoordinator {
    /// Create a coordinator; nothing is selected and no channel is open
    pub fn new(config: SessionConfig, observer: Arc<dyn SessionObserver>) -> Result<Self> {
        config.validate()?;
        let client = CommandClient::with_config(config.client)?;
        let channel = LiveChannel::new(config.stream)?;

        Ok(Self {
            client,
            channel,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::new()),
                observer,
            }),
            devices: Vec::new(),
            polls: Vec::new(),
        })
    }

    /// Replace the device list with what the backend sees and pick the first
    ///
    /// The selection of the first device reports its own outcome; discovery
    /// then confirms the number of devices found.
    pub async fn discover(&mut self) -> Result<Vec<DeviceDescriptor>> {
        let devices = match self.client.discover_devices().await {
            Ok(devices) => devices,
            Err(e) => return Err(self.fail(e.into())),
        };

        info!(count = devices.len(), "Discovery finished");
        self.devices = devices.clone();
        self.shared.observer.devices_changed(&self.devices);

        let Some(first) = devices.first() else {
            return Err(self.fail(SessionError::NoDevicesFound));
        };

        if let Err(e) = self.select_device(&first.hostname).await {
            debug!(error = %e, "Auto-selection after discovery failed");
        }
        self.shared
            .observer
            .notify(&format!("{} device(s) found", devices.len()), false);
        Ok(devices)
    }

    /// Target `hostname`, reopen the live channel for it and poll its status
    pub async fn select_device(&mut self, hostname: &str) -> Result<SelectionTag> {
        self.select(hostname, SelectionKind::Picked).await
    }

    /// Like [`select_device`](Self::select_device), and on success also add
    /// the hostname to the device list
    pub async fn set_manual_hostname(&mut self, hostname: &str) -> Result<SelectionTag> {
        self.select(hostname, SelectionKind::Manual).await
    }

    pub async fn play_preset(&self, preset: &str) -> Result<Preset> {
        let preset: Preset = self.validated(preset.parse())?;
        self.dispatch(Command::Preset(preset)).await?;
        Ok(preset)
    }

    /// Set the volume; the observer hears about the requested level before
    /// the backend answers
    pub async fn set_volume(&self, volume: &str) -> Result<Volume> {
        let volume: Volume = self.validated(volume.parse())?;
        self.shared.observer.volume_requested(volume);
        self.dispatch(Command::Volume(volume)).await?;
        Ok(volume)
    }

    pub async fn play_radio_url(&self, url: &str) -> Result<RadioUrl> {
        let url: RadioUrl = self.validated(url.parse())?;
        self.dispatch(Command::Radio(url.clone())).await?;
        Ok(url)
    }

    pub async fn play_youtube_url(&self, url: &str) -> Result<YouTubeUrl> {
        let url: YouTubeUrl = self.validated(url.parse())?;
        self.dispatch(Command::YouTube(url.clone())).await?;
        Ok(url)
    }

    pub async fn play_transport_action(&self, action: &str) -> Result<TransportAction> {
        let action = TransportAction::from(action);
        self.dispatch(Command::Transport(action.clone())).await?;
        Ok(action)
    }

    /// Poll the selected device's status and wait for the answer
    pub async fn refresh_status(&self) -> Result<()> {
        let tag = self.shared.state.lock().selection().cloned();
        let Some(tag) = tag else {
            return Err(self.fail(SessionError::NoSelection));
        };
        poll_status(&self.client, &self.shared, tag).await
    }

    /// Wait for status polls started by selections to finish
    pub async fn settle(&mut self) {
        for poll in self.polls.drain(..) {
            if let Err(e) = poll.await {
                warn!(error = %e, "Status poll task failed");
            }
        }
    }

    /// Close the live channel and stop accepting state updates
    pub async fn shutdown(&mut self) {
        self.shared.state.lock().detach();
        self.channel.close().await;
        for poll in self.polls.drain(..) {
            poll.abort();
        }
        info!("Session closed");
    }

    pub fn selection(&self) -> Option<SelectionTag> {
        self.shared.state.lock().selection().cloned()
    }

    pub fn selected_hostname(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .selected_hostname()
            .map(str::to_string)
    }

    /// Last accepted now-playing value, `None` before the first poll or push
    pub fn playback(&self) -> Option<PlaybackState> {
        self.shared.state.lock().playback().cloned()
    }

    pub fn volume(&self) -> Option<VolumeState> {
        self.shared.state.lock().volume().copied()
    }

    /// Selectable devices, discovered entries first, manual entries appended
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn channel_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Wait until the live channel reaches `state`, up to `timeout`
    pub async fn wait_for_channel(&self, state: ConnectionState, timeout: Duration) -> bool {
        self.channel.wait_for(state, timeout).await
    }

    async fn select(&mut self, raw: &str, kind: SelectionKind) -> Result<SelectionTag> {
        let hostname = self.validated(Hostname::new(raw))?;
        let command = Command::SelectDevice(hostname.clone());

        if let Err(e) = self.client.execute(&command).await {
            let error = SessionError::from(e);
            let error = match kind {
                SelectionKind::Picked => error,
                SelectionKind::Manual => error.with_message(MANUAL_FAILURE_MESSAGE),
            };
            return Err(self.fail(error));
        }

        let tag = self.shared.state.lock().select(hostname.as_str());
        info!(selection = %tag, "Device selected");

        match kind {
            SelectionKind::Picked => self.shared.observer.notify(&command.success_message(), false),
            SelectionKind::Manual => {
                self.devices.push(DeviceDescriptor::manual(hostname.as_str()));
                self.shared.observer.devices_changed(&self.devices);
                self.shared
                    .observer
                    .notify(&format!("Set manual hostname: {hostname}"), false);
            }
        }

        let sink = SelectionSink {
            tag: tag.clone(),
            shared: Arc::clone(&self.shared),
        };
        self.channel.open(sink).await;
        self.spawn_poll(tag.clone());
        Ok(tag)
    }

    async fn dispatch(&self, command: Command) -> Result<()> {
        match self.client.execute(&command).await {
            Ok(()) => {
                info!(endpoint = command.endpoint().name(), "Command accepted");
                self.shared
                    .observer
                    .notify(&command.success_message(), false);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn validated<T>(&self, input: std::result::Result<T, ValidationError>) -> Result<T> {
        input.map_err(|e| self.fail(e.into()))
    }

    /// Report `error` to the observer and hand it back
    fn fail(&self, error: SessionError) -> SessionError {
        warn!(error = %error, "Session action failed");
        self.shared.notify_error(&error);
        error
    }

    fn spawn_poll(&mut self, tag: SelectionTag) {
        self.polls.retain(|poll| !poll.is_finished());

        let client = self.client.clone();
        let shared = Arc::clone(&self.shared);
        self.polls.push(tokio::spawn(async move {
            // Failures are reported to the observer inside
            let _ = poll_status(&client, &shared, tag).await;
        }));
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shared.state.lock().detach();
        for poll in &self.polls {
            poll.abort();
        }
    }
}

async fn poll_status(client: &CommandClient, shared: &Shared, tag: SelectionTag) -> Result<()> {
    let ticket = shared.state.lock().poll_ticket(&tag);
    debug!(selection = %tag, "Polling status");

    match client.fetch_status().await {
        Ok(snapshot) => {
            shared.apply_poll(&ticket, snapshot);
            Ok(())
        }
        Err(e) => {
            let error = SessionError::from(e);
            if shared.is_current(&tag) {
                warn!(selection = %tag, error = %error, "Status poll failed");
                shared.notify_error(&error);
            } else {
                debug!(selection = %tag, error = %error, "Ignoring failed poll for superseded selection");
            }
            Err(error)
        }
    }
}
