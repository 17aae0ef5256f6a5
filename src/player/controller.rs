use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::driver::{ActiveDriver, DriverEvent, next_driver_event};
use super::synthetic::SyntheticClock;
use super::traits::MediaBackend;
use super::types::{BackendMode, PlaybackSession, PlaybackSnapshot, PlaybackState};
use crate::config::Config;
use crate::events::{
    EventBus, EventFilter, EventSubscriber, EventType, PlaybackEvent, StateTransition,
};
use crate::models::MeditationTrack;
use crate::utils::PlaybackError;

/// Commands that can be sent to the playback controller
#[derive(Debug)]
pub enum PlaybackCommand {
    /// Start or resume playback
    Start {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    /// Pause playback
    Pause {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    /// Pause when playing, start otherwise
    Toggle {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    /// Seek to an absolute position in seconds
    Seek {
        target_seconds: f64,
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    SkipForward {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    SkipBackward {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    /// Set volume in percent; out-of-range values are clamped
    SetVolume {
        percent: i32,
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    ToggleFavorite {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    GetSnapshot {
        respond_to: oneshot::Sender<PlaybackSnapshot>,
    },
    /// Release every driver and end the session
    Close { respond_to: oneshot::Sender<()> },
}

enum Step {
    Command(PlaybackCommand),
    Driver(DriverEvent),
}

/// Controller that owns one playback session and processes commands.
///
/// Everything runs on the controller task, so at most one driver (native
/// listener or synthetic clock) advances the session at any time.
pub struct PlaybackController {
    session: PlaybackSession,
    backend: Box<dyn MediaBackend>,
    driver: Option<ActiveDriver>,
    receiver: mpsc::UnboundedReceiver<PlaybackCommand>,
    events: EventBus,
    completions: EventBus,
    skip_seconds: f64,
    position_update_interval: Duration,
    last_position_event: Option<Instant>,
}

impl PlaybackController {
    /// Create a new controller for `track`, driven by `backend`
    pub fn new(
        track: &MeditationTrack,
        backend: Box<dyn MediaBackend>,
        config: &Config,
    ) -> (PlaybackHandle, PlaybackController) {
        let session = PlaybackSession::new(
            track,
            &config.playback.default_source_uri,
            config.playback.initial_volume,
        );
        let (sender, receiver) = mpsc::unbounded_channel();
        let events = EventBus::new(config.events.channel_capacity);
        let completions = EventBus::new(config.events.channel_capacity);

        let controller = PlaybackController {
            session,
            backend,
            driver: None,
            receiver,
            events: events.clone(),
            completions: completions.clone(),
            skip_seconds: config.playback.skip_seconds as f64,
            position_update_interval: Duration::from_millis(
                config.playback.position_update_interval_ms,
            ),
            last_position_event: None,
        };
        let handle = PlaybackHandle {
            sender,
            events,
            completions,
        };

        (handle, controller)
    }

    /// Create a controller and run it on a new tokio task
    pub fn spawn(
        track: &MeditationTrack,
        backend: Box<dyn MediaBackend>,
        config: &Config,
    ) -> (PlaybackHandle, JoinHandle<()>) {
        let (handle, controller) = Self::new(track, backend, config);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    /// Run the controller event loop until closed or every handle is dropped
    pub async fn run(mut self) {
        info!(
            "Playback session started: '{}' ({}s, {} backend)",
            self.session.snapshot().title,
            self.session.total_duration_seconds(),
            self.backend.name()
        );

        loop {
            let step = tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => break,
                },
                event = next_driver_event(&mut self.driver) => Step::Driver(event),
            };

            match step {
                Step::Command(command) => {
                    if !self.handle_command(command).await {
                        return;
                    }
                }
                Step::Driver(event) => self.handle_driver_event(event).await,
            }
        }

        debug!("All playback handles dropped");
        self.teardown().await;
    }

    /// Returns false once the session has been closed
    async fn handle_command(&mut self, command: PlaybackCommand) -> bool {
        match command {
            PlaybackCommand::Start { respond_to } => {
                trace!("Starting playback");
                self.start().await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::Pause { respond_to } => {
                trace!("Pausing playback");
                self.pause().await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::Toggle { respond_to } => {
                if self.session.is_playing() {
                    self.pause().await;
                } else {
                    self.start().await;
                }
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::Seek {
                target_seconds,
                respond_to,
            } => {
                trace!("Seeking to {}s", target_seconds);
                self.seek(target_seconds).await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::SkipForward { respond_to } => {
                let target = self.session.position_seconds() + self.skip_seconds;
                self.seek(target).await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::SkipBackward { respond_to } => {
                let target = self.session.position_seconds() - self.skip_seconds;
                self.seek(target).await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::SetVolume {
                percent,
                respond_to,
            } => {
                trace!("Setting volume to {}", percent);
                self.set_volume(percent).await;
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::ToggleFavorite { respond_to } => {
                let favorited = self.session.toggle_favorite();
                self.events
                    .publish(PlaybackEvent::FavoriteChanged { favorited });
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.session.snapshot());
            }
            PlaybackCommand::Close { respond_to } => {
                self.teardown().await;
                let _ = respond_to.send(());
                return false;
            }
        }
        true
    }

    async fn handle_driver_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::SyntheticTick(step) => {
                self.session.advance(step);
                self.publish_position();
                if self.session.at_end() {
                    self.complete().await;
                }
            }
            DriverEvent::NativePosition(position) => {
                self.session.set_position(position.as_secs_f64());
                if self.session.at_end() {
                    self.publish_position();
                    self.complete().await;
                } else {
                    self.publish_position_throttled();
                }
            }
            DriverEvent::NativeEnded => {
                debug!("{} backend reported end of media", self.backend.name());
                self.complete().await;
            }
            DriverEvent::NativeDetached => {
                warn!(
                    "{} backend closed its event stream without ending, pausing",
                    self.backend.name()
                );
                self.release_driver();
                self.transition(PlaybackState::Paused, "backend listener closed");
            }
        }
    }

    async fn start(&mut self) {
        if self.session.is_playing() {
            debug!("Start ignored, already playing");
            return;
        }

        // Fallback is sticky: once synthetic, the native backend is not retried
        if self.session.backend_mode() == BackendMode::Synthetic {
            self.engage_synthetic("resumed on synthetic clock");
            return;
        }

        let resuming = self.session.state() == PlaybackState::Paused;
        let source_uri = self.session.source_uri().to_string();

        match self.backend.attempt_start(&source_uri).await {
            Ok(listener) => {
                info!(
                    "{} backend playing {}",
                    self.backend.name(),
                    source_uri
                );
                self.driver = Some(ActiveDriver::Native(listener));

                self.apply_volume().await;
                let position = self.session.position_seconds();
                if !resuming && position > 0.0 {
                    self.relocate_backend(position).await;
                }

                self.transition(PlaybackState::PlayingNative, "native playback started");
            }
            Err(e) => {
                let failure = PlaybackError::start_failure(&e);
                warn!(
                    "{} backend could not play {}, falling back to synthetic clock: {}",
                    self.backend.name(),
                    source_uri,
                    failure
                );

                self.session.set_backend_mode(BackendMode::Synthetic);
                self.events.publish(PlaybackEvent::BackendModeChanged {
                    mode: BackendMode::Synthetic,
                });
                self.engage_synthetic("native start failed");
            }
        }
    }

    fn engage_synthetic(&mut self, reason: &str) {
        self.driver = Some(ActiveDriver::Synthetic(SyntheticClock::start()));
        self.transition(PlaybackState::PlayingSynthetic, reason);
    }

    async fn pause(&mut self) {
        if !self.session.is_playing() {
            trace!("Pause ignored, not playing");
            return;
        }

        if self.release_driver() == Some(BackendMode::Native) {
            if let Err(e) = self.backend.pause().await {
                warn!("{} backend failed to pause: {:#}", self.backend.name(), e);
            }
        }
        self.transition(PlaybackState::Paused, "paused by caller");
    }

    async fn seek(&mut self, target_seconds: f64) {
        let position = self.session.set_position(target_seconds);
        debug!("Position set to {:.1}s", position);
        self.publish_position();

        // Synthetic mode has nothing to relocate
        if self.session.backend_mode() == BackendMode::Native {
            self.relocate_backend(position).await;
        }
    }

    async fn set_volume(&mut self, percent: i32) {
        let stored = self.session.set_volume(percent);
        self.events
            .publish(PlaybackEvent::VolumeChanged { percent: stored });

        if self.session.backend_mode() == BackendMode::Native {
            self.apply_volume().await;
        }
    }

    async fn apply_volume(&mut self) {
        let level = f64::from(self.session.volume_percent()) / 100.0;
        if let Err(e) = self.backend.set_volume_level(level).await {
            warn!("{} backend rejected volume {}: {:#}", self.backend.name(), level, e);
        }
    }

    async fn relocate_backend(&mut self, position: f64) {
        if let Err(e) = self
            .backend
            .set_position(Duration::from_secs_f64(position))
            .await
        {
            debug!(
                "{} backend ignored seek to {:.1}s: {:#}",
                self.backend.name(),
                position,
                e
            );
        }
    }

    /// Rewind and go idle once the end is reached. Completion only counts
    /// while playing, so a late `Ended` after a position-driven completion is
    /// ignored.
    async fn complete(&mut self) {
        if !self.session.is_playing() {
            trace!("Completion ignored, not playing");
            return;
        }

        if self.release_driver() == Some(BackendMode::Native) {
            if let Err(e) = self.backend.pause().await {
                warn!("{} backend failed to stop: {:#}", self.backend.name(), e);
            }
            self.relocate_backend(0.0).await;
        }

        self.session.set_position(0.0);
        self.publish_position();
        info!("Playthrough of '{}' complete", self.session.snapshot().title);
        self.transition(PlaybackState::Idle, "playthrough complete");
        self.events.publish(PlaybackEvent::Completed);
        self.completions.publish(PlaybackEvent::Completed);
    }

    /// Drop the active driver, returning which kind it was
    fn release_driver(&mut self) -> Option<BackendMode> {
        self.last_position_event = None;
        let driver = self.driver.take()?;
        if let ActiveDriver::Synthetic(ref clock) = driver {
            debug!("Synthetic clock stopped after {} ticks", clock.ticks());
        }
        Some(driver.mode())
    }

    async fn teardown(&mut self) {
        if self.release_driver() == Some(BackendMode::Native) {
            if let Err(e) = self.backend.pause().await {
                warn!("{} backend failed to pause on close: {:#}", self.backend.name(), e);
            }
        }
        info!("Playback session closed");
    }

    fn transition(&mut self, to: PlaybackState, reason: &str) {
        let from = self.session.set_state(to);
        if from == to {
            return;
        }
        if !PlaybackState::is_valid_transition(&from, &to) {
            warn!("Unexpected playback transition {:?} -> {:?}", from, to);
        }

        debug!("Playback state {:?} -> {:?} ({})", from, to, reason);
        self.events.publish(PlaybackEvent::StateChanged(
            StateTransition::new(from, to).with_reason(reason),
        ));
    }

    fn publish_position(&self) {
        self.events.publish(PlaybackEvent::PositionChanged {
            position_seconds: self.session.position_seconds(),
            duration_seconds: self.session.total_duration_seconds(),
        });
    }

    fn publish_position_throttled(&mut self) {
        if let Some(last) = self.last_position_event {
            if last.elapsed() < self.position_update_interval {
                return;
            }
        }
        self.last_position_event = Some(Instant::now());
        self.publish_position();
    }
}

/// Handle to send commands to the playback controller
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    sender: mpsc::UnboundedSender<PlaybackCommand>,
    events: EventBus,
    completions: EventBus,
}

impl PlaybackHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> PlaybackCommand,
    ) -> Result<T, PlaybackError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| PlaybackError::ControllerDisconnected)?;
        response
            .await
            .map_err(|_| PlaybackError::ControllerDisconnected)
    }

    /// Start playback, falling back to the synthetic clock if the backend refuses
    pub async fn start(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::Start { respond_to })
            .await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::Pause { respond_to })
            .await
    }

    /// Toggle between playing and paused
    pub async fn toggle(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::Toggle { respond_to })
            .await
    }

    /// Seek to position
    pub async fn seek(&self, target_seconds: f64) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::Seek {
            target_seconds,
            respond_to,
        })
        .await
    }

    pub async fn skip_forward(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::SkipForward { respond_to })
            .await
    }

    pub async fn skip_backward(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::SkipBackward { respond_to })
            .await
    }

    /// Set volume in percent
    pub async fn set_volume(&self, percent: i32) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::SetVolume {
            percent,
            respond_to,
        })
        .await
    }

    pub async fn toggle_favorite(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::ToggleFavorite { respond_to })
            .await
    }

    /// Current session state for rendering
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|respond_to| PlaybackCommand::GetSnapshot { respond_to })
            .await
    }

    /// Tear the session down. Returns once every driver has been released.
    pub async fn close(&self) -> Result<(), PlaybackError> {
        self.request(|respond_to| PlaybackCommand::Close { respond_to })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Subscribe to every playback event
    pub fn subscribe(&self) -> EventSubscriber {
        self.events.subscribe()
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> EventSubscriber {
        self.events.subscribe_filtered(filter)
    }

    /// Position updates from either driver (at most once a second), seeks,
    /// and the rewind after a playthrough
    pub fn on_position_update(&self) -> EventSubscriber {
        self.subscribe_filtered(EventFilter::new().with_types(vec![EventType::PositionChanged]))
    }

    /// One `Completed` event per playthrough. Completions have their own
    /// channel, so a subscriber left behind by position traffic still sees them.
    pub fn on_complete(&self) -> EventSubscriber {
        self.completions.subscribe()
    }
}
