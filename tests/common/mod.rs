#![allow(dead_code)]

pub mod mocks;

use mindful_player::events::{EventSubscriber, PlaybackEvent};
use mindful_player::player::PlaybackController;
use mindful_player::{Config, MeditationTrack, PlaybackHandle};
use std::time::Duration;
use tokio::task::JoinHandle;

use mocks::MockMediaBackend;

pub const DEFAULT_SOURCE: &str = "https://example.org/rain.wav";

/// Defaults, with a channel large enough to hold a whole ten-minute playthrough
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.playback.default_source_uri = DEFAULT_SOURCE.to_string();
    config.events.channel_capacity = 1024;
    config
}

pub fn spawn_session(minutes: u32, backend: &MockMediaBackend) -> (PlaybackHandle, JoinHandle<()>) {
    let track = MeditationTrack::new("Morning Calm", minutes).with_instructor("Sarah Chen");
    PlaybackController::spawn(&track, backend.boxed(), &test_config())
}

/// Wait (in virtual time) for the next event the subscriber accepts
pub async fn next_event(subscriber: &mut EventSubscriber, within: Duration) -> PlaybackEvent {
    tokio::time::timeout(within, subscriber.recv())
        .await
        .expect("timed out waiting for playback event")
        .expect("event bus closed")
}

/// Drain whatever is already queued
pub fn drain(subscriber: &mut EventSubscriber) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Some(event) = subscriber.try_recv().expect("event bus closed") {
        events.push(event);
    }
    events
}
