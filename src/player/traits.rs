use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Notifications a native backend pushes while it is playing
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    TimeUpdate { position: Duration },
    Ended,
}

/// Listener attached by a successful start. Dropping it detaches the
/// listener; backends must treat a closed channel as "nobody is watching".
pub type BackendEvents = mpsc::UnboundedReceiver<BackendEvent>;

/// Minimal contract the controller needs from a real media stack.
///
/// Errors are opaque to the controller: a failed `attempt_start` means
/// "fall back", anything else is logged and ignored.
#[async_trait]
pub trait MediaBackend: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;
    async fn attempt_start(&mut self, source_uri: &str) -> Result<BackendEvents>;
    async fn pause(&mut self) -> Result<()>;
    async fn set_position(&mut self, position: Duration) -> Result<()>;
    /// `level` is within 0.0..=1.0
    async fn set_volume_level(&mut self, level: f64) -> Result<()>;
}

