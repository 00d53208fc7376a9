//! Selection and displayed-state bookkeeping
//!
//! Every successful selection gets a [`SelectionTag`]. Polls and channel
//! connections carry the tag they were started for, and anything arriving
//! with a tag other than the current one is dropped.
//!
//! Within one selection, each displayed value sits in a slot with a
//! revision number. A poll remembers the revisions it saw when it was
//! issued and only writes slots nobody touched in the meantime, so a push
//! that lands while the poll is in flight wins over the poll's late answer.

use std::fmt;

use soundtouch_api::{PlaybackState, StatusSnapshot, VolumeState};

/// Identity of one successful device selection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionTag {
    hostname: String,
    generation: u64,
}

impl SelectionTag {
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for SelectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.hostname, self.generation)
    }
}

/// Snapshot of slot revisions taken when a poll is issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    tag: SelectionTag,
    playback_revision: u64,
    volume_revision: u64,
}

impl PollTicket {
    pub fn tag(&self) -> &SelectionTag {
        &self.tag
    }
}

/// What a poll response ended up changing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The selection changed since the poll was issued; nothing was written
    Stale,
    /// Slots written by the poll; `false` means a newer push already owned it
    Applied { playback: bool, volume: bool },
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    revision: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            revision: 0,
        }
    }
}

/// The coordinator's mutable state
#[derive(Debug, Default)]
pub struct SessionState {
    selection: Option<SelectionTag>,
    generation: u64,
    revision: u64,
    detached: bool,
    playback: Slot<PlaybackState>,
    volume: Slot<VolumeState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&SelectionTag> {
        self.selection.as_ref()
    }

    pub fn selected_hostname(&self) -> Option<&str> {
        self.selection.as_ref().map(|tag| tag.hostname())
    }

    pub fn playback(&self) -> Option<&PlaybackState> {
        self.playback.value.as_ref()
    }

    pub fn volume(&self) -> Option<&VolumeState> {
        self.volume.value.as_ref()
    }

    /// Record a successful selection and return its tag
    ///
    /// Selecting the same hostname again still yields a fresh tag, which
    /// retires everything issued for the previous one.
    pub fn select(&mut self, hostname: &str) -> SelectionTag {
        self.generation += 1;
        self.detached = false;
        let tag = SelectionTag {
            hostname: hostname.to_string(),
            generation: self.generation,
        };
        self.selection = Some(tag.clone());
        tag
    }

    /// Stop accepting writes for the current selection without changing it
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn is_current(&self, tag: &SelectionTag) -> bool {
        !self.detached && self.selection.as_ref() == Some(tag)
    }

    /// Start a poll for `tag`
    pub fn poll_ticket(&self, tag: &SelectionTag) -> PollTicket {
        PollTicket {
            tag: tag.clone(),
            playback_revision: self.playback.revision,
            volume_revision: self.volume.revision,
        }
    }

    /// Accept a pushed playback value; returns whether it was written
    pub fn apply_playback(&mut self, tag: &SelectionTag, playback: PlaybackState) -> bool {
        if !self.is_current(tag) {
            return false;
        }
        let revision = self.next_revision();
        self.playback = Slot {
            value: Some(playback),
            revision,
        };
        true
    }

    /// Accept a pushed volume value; returns whether it was written
    pub fn apply_volume(&mut self, tag: &SelectionTag, volume: VolumeState) -> bool {
        if !self.is_current(tag) {
            return false;
        }
        let revision = self.next_revision();
        self.volume = Slot {
            value: Some(volume),
            revision,
        };
        true
    }

    /// Accept a poll response issued with `ticket`
    pub fn apply_poll(&mut self, ticket: &PollTicket, snapshot: StatusSnapshot) -> PollOutcome {
        if !self.is_current(&ticket.tag) {
            return PollOutcome::Stale;
        }

        let playback = self.playback.revision == ticket.playback_revision;
        if playback {
            let revision = self.next_revision();
            self.playback = Slot {
                value: Some(snapshot.playback),
                revision,
            };
        }

        let volume = self.volume.revision == ticket.volume_revision;
        if volume {
            let revision = self.next_revision();
            self.volume = Slot {
                value: Some(snapshot.volume),
                revision,
            };
        }

        PollOutcome::Applied { playback, volume }
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}
