use serde::{Deserialize, Serialize};

/// A guided session as handed over by the library view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeditationTrack {
    pub title: String,
    pub instructor: Option<String>,
    /// `None` falls back to the configured ambient recording
    pub audio_url: Option<String>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub is_favorited: bool,
}

impl MeditationTrack {
    pub fn new(title: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            title: title.into(),
            instructor: None,
            audio_url: None,
            duration_minutes,
            is_favorited: false,
        }
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn favorited(mut self, favorited: bool) -> Self {
        self.is_favorited = favorited;
        self
    }

    pub fn total_duration_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Source to hand to the native backend
    pub fn source_uri<'a>(&'a self, default_source_uri: &'a str) -> &'a str {
        match self.audio_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => default_source_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_is_minutes_times_sixty() {
        assert_eq!(MeditationTrack::new("Body Scan", 10).total_duration_seconds(), 600);
        assert_eq!(MeditationTrack::new("Empty", 0).total_duration_seconds(), 0);
    }

    #[test]
    fn test_source_uri_falls_back_to_default() {
        let default = "https://example.org/rain.wav";

        let track = MeditationTrack::new("Breath", 5);
        assert_eq!(track.source_uri(default), default);

        let blank = MeditationTrack::new("Breath", 5).with_audio_url("  ");
        assert_eq!(blank.source_uri(default), default);

        let own = MeditationTrack::new("Breath", 5).with_audio_url("file:///tmp/breath.ogg");
        assert_eq!(own.source_uri(default), "file:///tmp/breath.ogg");
    }
}
