pub mod controller;
pub mod driver;
pub mod factory;
#[cfg(feature = "gstreamer")]
pub mod gstreamer_player;
pub mod synthetic;
pub mod traits;
pub mod types;
pub mod unavailable;

pub use controller::{PlaybackCommand, PlaybackController, PlaybackHandle};
pub use factory::{BackendKind, create_backend};
#[cfg(feature = "gstreamer")]
pub use gstreamer_player::GStreamerBackend;
pub use synthetic::{SYNTHETIC_TICK, SyntheticClock};
pub use traits::{BackendEvent, BackendEvents, MediaBackend};
pub use types::{BackendMode, PlaybackSession, PlaybackSnapshot, PlaybackState};
pub use unavailable::UnavailableBackend;
