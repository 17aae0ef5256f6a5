use tracing::{info, warn};

use super::UnavailableBackend;
use super::traits::MediaBackend;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Best native backend compiled into this build
    Auto,
    GStreamer,
    /// Always run on the synthetic clock
    None,
}

impl From<&str> for BackendKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gstreamer" | "gst" => BackendKind::GStreamer,
            "none" | "synthetic" => BackendKind::None,
            _ => BackendKind::Auto, // Default to whatever is available
        }
    }
}

/// Build the native backend named by the config.
///
/// Never fails: a backend that cannot be constructed is replaced by
/// [`UnavailableBackend`], which sends every session to the synthetic clock.
pub fn create_backend(config: &Config) -> Box<dyn MediaBackend> {
    let kind = BackendKind::from(config.playback.backend.as_str());

    match kind {
        BackendKind::None => {
            info!("Native playback disabled by configuration");
            Box::new(UnavailableBackend::with_reason("disabled by configuration"))
        }
        BackendKind::Auto | BackendKind::GStreamer => native_backend(kind),
    }
}

#[cfg(feature = "gstreamer")]
fn native_backend(_kind: BackendKind) -> Box<dyn MediaBackend> {
    match super::GStreamerBackend::new() {
        Ok(backend) => {
            info!("Creating GStreamer playback backend");
            Box::new(backend)
        }
        Err(e) => {
            warn!("GStreamer unavailable, sessions will be visual-only: {:#}", e);
            Box::new(UnavailableBackend::with_reason(format!("{:#}", e)))
        }
    }
}

#[cfg(not(feature = "gstreamer"))]
fn native_backend(kind: BackendKind) -> Box<dyn MediaBackend> {
    if kind == BackendKind::GStreamer {
        warn!("GStreamer backend requested but this build was compiled without it");
    }
    info!("No native playback backend compiled in, sessions will be visual-only");
    Box::new(UnavailableBackend::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!(BackendKind::from("GStreamer"), BackendKind::GStreamer);
        assert_eq!(BackendKind::from("synthetic"), BackendKind::None);
        assert_eq!(BackendKind::from("none"), BackendKind::None);
        assert_eq!(BackendKind::from("auto"), BackendKind::Auto);
        assert_eq!(BackendKind::from("mpv"), BackendKind::Auto);
    }

    #[tokio::test]
    async fn test_disabled_backend_rejects_start() {
        let mut config = Config::default();
        config.playback.backend = "none".to_string();

        let mut backend = create_backend(&config);
        assert_eq!(backend.name(), "unavailable");
        assert!(backend.attempt_start("file:///tmp/rain.wav").await.is_err());
    }
}
