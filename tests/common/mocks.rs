use anyhow::{Result, anyhow};
use async_trait::async_trait;
use mindful_player::player::{BackendEvent, BackendEvents, MediaBackend};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    AttemptStart(String),
    Pause,
    SetPosition(Duration),
    SetVolumeLevel(f64),
}

#[derive(Default)]
struct MockState {
    start_error: Option<String>,
    calls: Vec<MockCall>,
    listener: Option<mpsc::UnboundedSender<BackendEvent>>,
}

/// Scriptable backend. Clones share state, so a test keeps one clone as a
/// probe and hands the other to the controller.
#[derive(Clone, Default)]
pub struct MockMediaBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose every start is rejected
    pub fn failing(reason: &str) -> Self {
        let backend = Self::new();
        backend.inject_start_error(reason.to_string());
        backend
    }

    pub fn inject_start_error(&self, error: String) {
        self.state.lock().unwrap().start_error = Some(error);
    }

    pub fn clear_start_error(&self) {
        self.state.lock().unwrap().start_error = None;
    }

    pub fn boxed(&self) -> Box<dyn MediaBackend> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn start_attempts(&self) -> usize {
        self.count(|call| matches!(call, MockCall::AttemptStart(_)))
    }

    pub fn pause_calls(&self) -> usize {
        self.count(|call| *call == MockCall::Pause)
    }

    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    /// Push an event to the controller. Returns false when no listener is attached.
    pub fn emit(&self, event: BackendEvent) -> bool {
        match self.state.lock().unwrap().listener.as_ref() {
            Some(listener) => listener.send(event).is_ok(),
            None => false,
        }
    }

    pub fn emit_position(&self, seconds: f64) -> bool {
        self.emit(BackendEvent::TimeUpdate {
            position: Duration::from_secs_f64(seconds),
        })
    }

    pub fn listener_attached(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .listener
            .as_ref()
            .is_some_and(|listener| !listener.is_closed())
    }

    /// Close the backend side of the listener without sending `Ended`
    pub fn drop_listener(&self) {
        self.state.lock().unwrap().listener = None;
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MediaBackend for MockMediaBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn attempt_start(&mut self, source_uri: &str) -> Result<BackendEvents> {
        self.record(MockCall::AttemptStart(source_uri.to_string()));

        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.start_error.clone() {
            return Err(anyhow!(error));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.listener = Some(tx);
        Ok(rx)
    }

    async fn pause(&mut self) -> Result<()> {
        self.record(MockCall::Pause);
        Ok(())
    }

    async fn set_position(&mut self, position: Duration) -> Result<()> {
        self.record(MockCall::SetPosition(position));
        Ok(())
    }

    async fn set_volume_level(&mut self, level: f64) -> Result<()> {
        self.record(MockCall::SetVolumeLevel(level));
        Ok(())
    }
}
