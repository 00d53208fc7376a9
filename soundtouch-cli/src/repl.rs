//! Line-oriented command loop

use anyhow::{Context, Result};
use soundtouch_session::{DeviceDescriptor, SessionCoordinator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::observer::device_lines;

pub const HELP: &str = "\
Commands:
  discover            find devices and select the first one
  devices             list selectable devices
  select <host|n>     select a device by hostname or list number
  manual <host>       select a hostname discovery did not report
  preset <1-6>        play a preset
  volume <0-100>      set the volume
  radio <url>         play an internet radio stream
  youtube <url>       play the audio of a YouTube video
  play <action>       send a transport key (PLAY, PAUSE, NEXT_TRACK...)
  status              poll now-playing and volume
  state               show the current selection and state
  help                show this text
  quit                exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Discover,
    Devices,
    Select(String),
    Manual(String),
    Preset(String),
    Volume(String),
    Radio(String),
    YouTube(String),
    Play(String),
    Status,
    State,
    Help,
    Quit,
    Empty,
}

impl ReplCommand {
    /// Parse a line; arguments are passed through unvalidated
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim().to_string()),
            None => (line, String::new()),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => ReplCommand::Empty,
            "discover" => ReplCommand::Discover,
            "devices" | "ls" => ReplCommand::Devices,
            "select" => ReplCommand::Select(rest),
            "manual" => ReplCommand::Manual(rest),
            "preset" => ReplCommand::Preset(rest),
            "volume" | "vol" => ReplCommand::Volume(rest),
            "radio" => ReplCommand::Radio(rest),
            "youtube" | "yt" => ReplCommand::YouTube(rest),
            "play" => ReplCommand::Play(rest),
            "status" => ReplCommand::Status,
            "state" => ReplCommand::State,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            other => return Err(format!("Unknown command '{other}'. Type 'help' for a list.")),
        };
        Ok(command)
    }
}

/// Turn a `select` argument into a hostname; list numbers start at 1
pub fn resolve_device(argument: &str, devices: &[DeviceDescriptor]) -> String {
    argument
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| devices.get(i))
        .map(|device| device.hostname.clone())
        .unwrap_or_else(|| argument.to_string())
}

/// Read commands from stdin until `quit`, end of input or Ctrl+C
pub async fn run(session: &mut SessionCoordinator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match ReplCommand::parse(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => execute(session, command).await,
            Err(message) => println!("[error] {message}"),
        }
    }
    Ok(())
}

async fn execute(session: &mut SessionCoordinator, command: ReplCommand) {
    // Outcomes are printed by the observer; errors are only logged here
    let result = match command {
        ReplCommand::Discover => session.discover().await.map(|_| ()),
        ReplCommand::Select(argument) => {
            let hostname = resolve_device(&argument, session.devices());
            session.select_device(&hostname).await.map(|_| ())
        }
        ReplCommand::Manual(hostname) => session.set_manual_hostname(&hostname).await.map(|_| ()),
        ReplCommand::Preset(preset) => session.play_preset(&preset).await.map(|_| ()),
        ReplCommand::Volume(volume) => session.set_volume(&volume).await.map(|_| ()),
        ReplCommand::Radio(url) => session.play_radio_url(&url).await.map(|_| ()),
        ReplCommand::YouTube(url) => session.play_youtube_url(&url).await.map(|_| ()),
        ReplCommand::Play(action) => session.play_transport_action(&action).await.map(|_| ()),
        ReplCommand::Status => session.refresh_status().await,
        ReplCommand::Devices => {
            for line in device_lines(session.devices()) {
                println!("{line}");
            }
            Ok(())
        }
        ReplCommand::State => {
            print_state(session);
            Ok(())
        }
        ReplCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ReplCommand::Quit | ReplCommand::Empty => Ok(()),
    };

    if let Err(e) = result {
        debug!(error = %e, "Command did not succeed");
    }
}

fn print_state(session: &SessionCoordinator) {
    let selected = session
        .selected_hostname()
        .unwrap_or_else(|| "none".to_string());
    let playback = session
        .playback()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown - Unknown".to_string());
    let volume = session.volume().unwrap_or_default();

    println!("selected: {selected}");
    println!("now playing: {playback}");
    println!("volume: {volume} (slider {})", volume.slider_value());
    println!("live channel: {:?}", session.channel_state());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("discover", ReplCommand::Discover)]
    #[case("  select kitchen.local ", ReplCommand::Select("kitchen.local".into()))]
    #[case("select", ReplCommand::Select(String::new()))]
    #[case("MANUAL studio", ReplCommand::Manual("studio".into()))]
    #[case("preset 3", ReplCommand::Preset("3".into()))]
    #[case("vol 40", ReplCommand::Volume("40".into()))]
    #[case("radio http://a.example/stream", ReplCommand::Radio("http://a.example/stream".into()))]
    #[case("yt https://youtube.com/watch?v=x", ReplCommand::YouTube("https://youtube.com/watch?v=x".into()))]
    #[case("play PAUSE", ReplCommand::Play("PAUSE".into()))]
    #[case("", ReplCommand::Empty)]
    #[case("q", ReplCommand::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: ReplCommand) {
        assert_eq!(ReplCommand::parse(line).unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_command() {
        let error = ReplCommand::parse("shuffle on").unwrap_err();
        assert!(error.contains("shuffle"));
    }

    #[test]
    fn test_resolve_device() {
        let devices = vec![
            DeviceDescriptor::manual("kitchen"),
            DeviceDescriptor::manual("den"),
        ];
        assert_eq!(resolve_device("2", &devices), "den");
        assert_eq!(resolve_device("0", &devices), "0");
        assert_eq!(resolve_device("3", &devices), "3");
        assert_eq!(resolve_device("studio", &devices), "studio");
    }
}
