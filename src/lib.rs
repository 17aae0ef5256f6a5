// Playback core for guided meditation sessions.
// The binary in src/main.rs is a thin terminal front end over this library.

pub mod config;
pub mod events;
pub mod models;
pub mod player;
pub mod utils;

pub use config::Config;
pub use events::{EventFilter, EventSubscriber, EventType, PlaybackEvent};
pub use models::MeditationTrack;
pub use player::{
    BackendEvent, BackendMode, MediaBackend, PlaybackController, PlaybackHandle,
    PlaybackSnapshot, PlaybackState,
};
pub use utils::PlaybackError;
