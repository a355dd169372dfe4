//! Track selection and playback state.
//!
//! The [`Deck`] decides what should happen when a track is picked; actual
//! audio output is a [`PlaybackSink`] concern. State changes return the
//! commands a sink should receive, so callers can commit state first and
//! drive audio afterwards.

use std::time::Duration;

use serde::Serialize;

use crate::catalog::Track;

/// Whether the selected track is audible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

/// The selected track and where playback is within it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    pub track: Track,
    pub status: PlaybackStatus,
    pub position: Duration,
    /// Track length, once known.
    pub duration: Option<Duration>,
    pub looping: bool,
}

/// Instruction for an audio output.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Load `track` and play it from position zero.
    Start { track: Track, looping: bool },
    Pause { track: Track },
    /// Continue from the current position.
    Resume { track: Track },
    Stop { track: Track },
}

/// Audio output driven by the deck.
pub trait PlaybackSink: Send + Sync {
    fn apply(&self, command: &PlaybackCommand);
}

/// Sink that only logs, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PlaybackSink for TracingSink {
    fn apply(&self, command: &PlaybackCommand) {
        match command {
            PlaybackCommand::Start { track, looping } => {
                tracing::info!(track = track.id, title = track.title, looping, "Playback started")
            }
            PlaybackCommand::Pause { track } => {
                tracing::info!(track = track.id, "Playback paused")
            }
            PlaybackCommand::Resume { track } => {
                tracing::info!(track = track.id, "Playback resumed")
            }
            PlaybackCommand::Stop { track } => {
                tracing::info!(track = track.id, "Playback stopped")
            }
        }
    }
}

/// Selected-track state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deck {
    current: Option<Playback>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a track.
    ///
    /// A different track stops the previous one and starts the new one at
    /// position zero. The already-selected track toggles between playing and
    /// paused and keeps its position.
    pub fn select(&mut self, track: Track) -> Vec<PlaybackCommand> {
        match self.current.as_mut() {
            Some(playback) if playback.track.id == track.id => match playback.status {
                PlaybackStatus::Playing => {
                    playback.status = PlaybackStatus::Paused;
                    vec![PlaybackCommand::Pause { track }]
                }
                PlaybackStatus::Paused => {
                    playback.status = PlaybackStatus::Playing;
                    vec![PlaybackCommand::Resume { track }]
                }
            },
            _ => {
                let mut commands = Vec::with_capacity(2);
                if let Some(previous) = self.current.take() {
                    commands.push(PlaybackCommand::Stop {
                        track: previous.track,
                    });
                }
                self.current = Some(Playback {
                    track,
                    status: PlaybackStatus::Playing,
                    position: Duration::ZERO,
                    duration: None,
                    looping: true,
                });
                commands.push(PlaybackCommand::Start {
                    track,
                    looping: true,
                });
                commands
            }
        }
    }

    /// Drop the selection entirely.
    pub fn clear(&mut self) -> Vec<PlaybackCommand> {
        self.current
            .take()
            .map(|playback| {
                vec![PlaybackCommand::Stop {
                    track: playback.track,
                }]
            })
            .unwrap_or_default()
    }

    /// Move the play head forward by `elapsed` if playing.
    ///
    /// With a known duration, looping tracks wrap and non-looping tracks
    /// pause at the end.
    pub fn advance(&mut self, elapsed: Duration) {
        let Some(playback) = self.current.as_mut() else {
            return;
        };
        if playback.status != PlaybackStatus::Playing {
            return;
        }

        let next = playback.position + elapsed;
        playback.position = match playback.duration {
            Some(total) if !total.is_zero() && next >= total => {
                if playback.looping {
                    Duration::from_nanos((next.as_nanos() % total.as_nanos()) as u64)
                } else {
                    playback.status = PlaybackStatus::Paused;
                    total
                }
            }
            _ => next,
        };
    }

    /// Record the length of the selected track once it is known.
    pub fn set_duration(&mut self, duration: Duration) {
        if let Some(playback) = self.current.as_mut() {
            playback.duration = Some(duration);
        }
    }

    pub fn current(&self) -> Option<&Playback> {
        self.current.as_ref()
    }

    pub fn selected_track(&self) -> Option<Track> {
        self.current.as_ref().map(|p| p.track)
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .as_ref()
            .map(|p| p.status == PlaybackStatus::Playing)
            .unwrap_or(false)
    }

    pub fn position(&self) -> Duration {
        self.current
            .as_ref()
            .map(|p| p.position)
            .unwrap_or(Duration::ZERO)
    }
}
