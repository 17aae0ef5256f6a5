use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The native backend refused to begin playback. Absorbed by the
    /// controller, which switches to the synthetic clock instead.
    #[error("Backend start failure: {0}")]
    BackendStartFailure(String),

    #[error("Playback controller disconnected")]
    ControllerDisconnected,

    #[error("Event channel closed")]
    EventChannelClosed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PlaybackError {
    pub fn start_failure(err: &anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        Self::BackendStartFailure(format!("{:#}", err))
    }
}
