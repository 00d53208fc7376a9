//! Prints session output to the terminal

use soundtouch_session::{
    CloseReason, DeviceDescriptor, PlaybackState, SessionObserver, Volume, VolumeState,
};

/// Writes notifications and state changes to stdout, one line each
#[derive(Debug, Default)]
pub struct TerminalObserver;

impl TerminalObserver {
    pub fn new() -> Self {
        Self
    }
}

/// Line printed for a notification
pub fn notification_line(message: &str, is_error: bool) -> String {
    let tag = if is_error { "[error]" } else { "[ok]" };
    format!("{tag} {message}")
}

/// Lines printed for a device list, numbered from 1
pub fn device_lines(devices: &[DeviceDescriptor]) -> Vec<String> {
    if devices.is_empty() {
        return vec!["  (no devices)".to_string()];
    }
    devices
        .iter()
        .enumerate()
        .map(|(i, device)| format!("  {}. {}", i + 1, device.label()))
        .collect()
}

impl SessionObserver for TerminalObserver {
    fn notify(&self, message: &str, is_error: bool) {
        println!("{}", notification_line(message, is_error));
    }

    fn playback_changed(&self, playback: &PlaybackState) {
        println!("now playing: {playback}");
    }

    fn volume_changed(&self, volume: &VolumeState) {
        println!("volume: {volume} (slider {})", volume.slider_value());
    }

    fn devices_changed(&self, devices: &[DeviceDescriptor]) {
        println!("devices:");
        for line in device_lines(devices) {
            println!("{line}");
        }
    }

    fn volume_requested(&self, volume: Volume) {
        println!("volume: {volume} (requested)");
    }

    fn connection_lost(&self, reason: &CloseReason) {
        println!("live updates stopped ({reason}); select a device to reconnect");
    }
}
