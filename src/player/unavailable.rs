use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;

use super::traits::{BackendEvents, MediaBackend};

/// Stand-in for builds without a native media stack. Every start is
/// rejected, so sessions always run on the synthetic clock.
#[derive(Debug, Default)]
pub struct UnavailableBackend {
    reason: Option<String>,
}

impl UnavailableBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
impl MediaBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn attempt_start(&mut self, source_uri: &str) -> Result<BackendEvents> {
        Err(anyhow!(
            "No native media backend available to play {}: {}",
            source_uri,
            self.reason.as_deref().unwrap_or("not compiled in")
        ))
    }

    async fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    async fn set_position(&mut self, _position: Duration) -> Result<()> {
        Ok(())
    }

    async fn set_volume_level(&mut self, _level: f64) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_is_always_rejected() {
        let mut backend = UnavailableBackend::with_reason("gstreamer init failed");
        let err = backend.attempt_start("file:///tmp/rain.wav").await.unwrap_err();
        assert!(err.to_string().contains("gstreamer init failed"));
        assert!(backend.pause().await.is_ok());
    }
}
