//! Common types shared by the controller and its drivers
use serde::{Deserialize, Serialize};

use crate::models::MeditationTrack;
use crate::utils::{format_time, progress_percent};

/// Which driver advances the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendMode {
    /// A real media backend reports position
    #[default]
    Native,
    /// The native backend could not start; a local one-second clock stands in
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    PlayingNative,
    PlayingSynthetic,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::PlayingNative | Self::PlayingSynthetic)
    }

    pub fn playing_in(mode: BackendMode) -> Self {
        match mode {
            BackendMode::Native => Self::PlayingNative,
            BackendMode::Synthetic => Self::PlayingSynthetic,
        }
    }

    pub fn is_valid_transition(from: &Self, to: &Self) -> bool {
        use PlaybackState::*;
        matches!(
            (from, to),
            (Idle | Paused, PlayingNative | PlayingSynthetic)
                | (PlayingNative | PlayingSynthetic, Paused | Idle)
        )
    }
}

/// Ephemeral playback state for one piece of content.
///
/// Position is kept within `0..=total_duration_seconds` by every mutator.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    title: String,
    instructor: Option<String>,
    source_uri: String,
    total_duration_seconds: u64,
    current_position_seconds: f64,
    volume_percent: u8,
    backend_mode: BackendMode,
    state: PlaybackState,
    is_favorited: bool,
}

impl PlaybackSession {
    pub fn new(track: &MeditationTrack, default_source_uri: &str, initial_volume: u8) -> Self {
        Self {
            title: track.title.clone(),
            instructor: track.instructor.clone(),
            source_uri: track.source_uri(default_source_uri).to_string(),
            total_duration_seconds: track.total_duration_seconds(),
            current_position_seconds: 0.0,
            volume_percent: initial_volume.min(100),
            backend_mode: BackendMode::Native,
            state: PlaybackState::Idle,
            is_favorited: track.is_favorited,
        }
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.total_duration_seconds
    }

    pub fn position_seconds(&self) -> f64 {
        self.current_position_seconds
    }

    pub fn volume_percent(&self) -> u8 {
        self.volume_percent
    }

    pub fn backend_mode(&self) -> BackendMode {
        self.backend_mode
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_favorited(&self) -> bool {
        self.is_favorited
    }

    pub fn clamp_position(&self, seconds: f64) -> f64 {
        let total = self.total_duration_seconds as f64;
        if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, total)
        }
    }

    /// Move to `seconds` (clamped) and return where the session landed
    pub fn set_position(&mut self, seconds: f64) -> f64 {
        self.current_position_seconds = self.clamp_position(seconds);
        self.current_position_seconds
    }

    pub fn advance(&mut self, seconds: f64) -> f64 {
        self.set_position(self.current_position_seconds + seconds)
    }

    pub fn at_end(&self) -> bool {
        self.current_position_seconds >= self.total_duration_seconds as f64
    }

    /// Store `percent` clamped to 0..=100
    pub fn set_volume(&mut self, percent: i32) -> u8 {
        self.volume_percent = percent.clamp(0, 100) as u8;
        self.volume_percent
    }

    pub fn set_backend_mode(&mut self, mode: BackendMode) {
        self.backend_mode = mode;
    }

    /// Returns the previous state
    pub fn set_state(&mut self, state: PlaybackState) -> PlaybackState {
        std::mem::replace(&mut self.state, state)
    }

    pub fn toggle_favorite(&mut self) -> bool {
        self.is_favorited = !self.is_favorited;
        self.is_favorited
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            title: self.title.clone(),
            instructor: self.instructor.clone(),
            position_seconds: self.current_position_seconds,
            duration_seconds: self.total_duration_seconds,
            is_playing: self.is_playing(),
            volume_percent: self.volume_percent,
            backend_mode: self.backend_mode,
            state: self.state,
            is_favorited: self.is_favorited,
        }
    }
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub title: String,
    pub instructor: Option<String>,
    pub position_seconds: f64,
    pub duration_seconds: u64,
    pub is_playing: bool,
    pub volume_percent: u8,
    pub backend_mode: BackendMode,
    pub state: PlaybackState,
    pub is_favorited: bool,
}

impl PlaybackSnapshot {
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.position_seconds, self.duration_seconds)
    }

    pub fn elapsed_label(&self) -> String {
        format_time(self.position_seconds)
    }

    pub fn duration_label(&self) -> String {
        format_time(self.duration_seconds as f64)
    }

    /// True when progress is simulated and there is nothing to hear
    pub fn is_visual_only(&self) -> bool {
        self.backend_mode == BackendMode::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(minutes: u32) -> PlaybackSession {
        PlaybackSession::new(
            &MeditationTrack::new("Evening Wind-Down", minutes),
            "https://example.org/rain.wav",
            50,
        )
    }

    #[test]
    fn test_new_session_defaults() {
        let session = session(10);
        assert_eq!(session.total_duration_seconds(), 600);
        assert_eq!(session.position_seconds(), 0.0);
        assert_eq!(session.volume_percent(), 50);
        assert_eq!(session.backend_mode(), BackendMode::Native);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(!session.is_playing());
        assert_eq!(session.source_uri(), "https://example.org/rain.wav");
    }

    #[test]
    fn test_set_position_clamps() {
        let mut session = session(10);
        assert_eq!(session.set_position(700.0), 600.0);
        assert_eq!(session.set_position(-5.0), 0.0);
        assert_eq!(session.set_position(123.5), 123.5);
        assert_eq!(session.set_position(f64::NAN), 0.0);
        assert_eq!(session.set_position(f64::INFINITY), 600.0);
        assert_eq!(session.set_position(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut session = session(1);
        session.set_position(59.0);
        assert!(!session.at_end());
        assert_eq!(session.advance(1.0), 60.0);
        assert!(session.at_end());
        assert_eq!(session.advance(1.0), 60.0);
    }

    #[test]
    fn test_empty_session_is_always_at_end() {
        let mut session = session(0);
        assert!(session.at_end());
        assert_eq!(session.advance(1.0), 0.0);
    }

    #[test]
    fn test_volume_clamps() {
        let mut session = session(10);
        assert_eq!(session.set_volume(150), 100);
        assert_eq!(session.set_volume(-20), 0);
        assert_eq!(session.set_volume(35), 35);
        assert_eq!(session.volume_percent(), 35);
    }

    #[test]
    fn test_state_transitions() {
        use PlaybackState::*;
        assert!(PlaybackState::is_valid_transition(&Idle, &PlayingNative));
        assert!(PlaybackState::is_valid_transition(&Paused, &PlayingSynthetic));
        assert!(PlaybackState::is_valid_transition(&PlayingNative, &Paused));
        assert!(PlaybackState::is_valid_transition(&PlayingSynthetic, &Idle));

        assert!(!PlaybackState::is_valid_transition(&Idle, &Paused));
        assert!(!PlaybackState::is_valid_transition(&PlayingNative, &PlayingSynthetic));
        assert!(!PlaybackState::is_valid_transition(&Paused, &Idle));
    }

    #[test]
    fn test_snapshot_labels() {
        let mut session = session(10);
        session.set_position(150.0);
        session.set_backend_mode(BackendMode::Synthetic);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.elapsed_label(), "2:30");
        assert_eq!(snapshot.duration_label(), "10:00");
        assert_eq!(snapshot.progress_percent(), 25.0);
        assert!(snapshot.is_visual_only());
    }
}
