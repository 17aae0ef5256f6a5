use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::types::{BackendMode, PlaybackState};

/// Events published by a playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    PositionChanged {
        position_seconds: f64,
        duration_seconds: u64,
    },
    /// Published once per playthrough, after the session has been rewound
    Completed,
    StateChanged(StateTransition),
    BackendModeChanged {
        mode: BackendMode,
    },
    VolumeChanged {
        percent: u8,
    },
    FavoriteChanged {
        favorited: bool,
    },
}

impl PlaybackEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PositionChanged { .. } => EventType::PositionChanged,
            Self::Completed => EventType::Completed,
            Self::StateChanged(_) => EventType::StateChanged,
            Self::BackendModeChanged { .. } => EventType::BackendModeChanged,
            Self::VolumeChanged { .. } => EventType::VolumeChanged,
            Self::FavoriteChanged { .. } => EventType::FavoriteChanged,
        }
    }
}

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    PositionChanged,
    Completed,
    StateChanged,
    BackendModeChanged,
    VolumeChanged,
    FavoriteChanged,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PositionChanged => "playback.position_changed",
            Self::Completed => "playback.completed",
            Self::StateChanged => "playback.state_changed",
            Self::BackendModeChanged => "playback.backend_mode_changed",
            Self::VolumeChanged => "playback.volume_changed",
            Self::FavoriteChanged => "playback.favorite_changed",
        }
    }
}

/// State transition event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: PlaybackState,
    pub to: PlaybackState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

impl StateTransition {
    pub fn new(from: PlaybackState, to: PlaybackState) -> Self {
        Self {
            from,
            to,
            timestamp: Utc::now(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
