//! The UI collaborator seen from the session layer

use soundtouch_api::{DeviceDescriptor, PlaybackState, Volume, VolumeState};
use soundtouch_stream::CloseReason;

/// Receiver of everything the session wants to show the user
///
/// State callbacks are invoked while the session's state lock is held, so
/// the order of calls matches the order in which values were accepted.
/// Implementations must return quickly and must not call back into the
/// coordinator.
pub trait SessionObserver: Send + Sync {
    /// One confirmation or error per user action
    fn notify(&self, message: &str, is_error: bool);

    /// Now-playing changed; the value replaces the previous one wholesale
    fn playback_changed(&self, playback: &PlaybackState);

    /// Device volume changed; drives both the readout and the slider
    fn volume_changed(&self, volume: &VolumeState);

    /// The selectable device list was replaced or extended
    fn devices_changed(&self, devices: &[DeviceDescriptor]);

    /// A volume change was requested and is about to be sent
    fn volume_requested(&self, _volume: Volume) {}

    /// The live channel of the current selection closed
    fn connection_lost(&self, _reason: &CloseReason) {}
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn notify(&self, _message: &str, _is_error: bool) {}
    fn playback_changed(&self, _playback: &PlaybackState) {}
    fn volume_changed(&self, _volume: &VolumeState) {}
    fn devices_changed(&self, _devices: &[DeviceDescriptor]) {}
}
