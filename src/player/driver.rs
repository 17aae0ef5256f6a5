use std::time::Duration;

use super::synthetic::SyntheticClock;
use super::traits::{BackendEvent, BackendEvents};
use super::types::BackendMode;

/// What advanced the session clock
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// Native backend reported an absolute position
    NativePosition(Duration),
    NativeEnded,
    /// Backend dropped its side of the listener without ending
    NativeDetached,
    /// Synthetic clock advanced by this many seconds
    SyntheticTick(f64),
}

/// The one driver currently moving a session forward.
///
/// Owned by the controller while a `Playing*` state is active and dropped on
/// every transition out of it, which detaches the backend listener or stops
/// the synthetic clock.
#[derive(Debug)]
pub enum ActiveDriver {
    Native(BackendEvents),
    Synthetic(SyntheticClock),
}

impl ActiveDriver {
    pub fn mode(&self) -> BackendMode {
        match self {
            ActiveDriver::Native(_) => BackendMode::Native,
            ActiveDriver::Synthetic(_) => BackendMode::Synthetic,
        }
    }

    pub async fn next_event(&mut self) -> DriverEvent {
        match self {
            ActiveDriver::Native(events) => match events.recv().await {
                Some(BackendEvent::TimeUpdate { position }) => DriverEvent::NativePosition(position),
                Some(BackendEvent::Ended) => DriverEvent::NativeEnded,
                None => DriverEvent::NativeDetached,
            },
            ActiveDriver::Synthetic(clock) => DriverEvent::SyntheticTick(clock.tick().await),
        }
    }
}

/// Next event from `driver`, or never when nothing is driving the session
pub async fn next_driver_event(driver: &mut Option<ActiveDriver>) -> DriverEvent {
    match driver {
        Some(driver) => driver.next_event().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_native_driver_maps_backend_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut driver = ActiveDriver::Native(rx);
        assert_eq!(driver.mode(), BackendMode::Native);

        tx.send(BackendEvent::TimeUpdate {
            position: Duration::from_secs(3),
        })
        .unwrap();
        tx.send(BackendEvent::Ended).unwrap();
        drop(tx);

        assert_eq!(
            driver.next_event().await,
            DriverEvent::NativePosition(Duration::from_secs(3))
        );
        assert_eq!(driver.next_event().await, DriverEvent::NativeEnded);
        assert_eq!(driver.next_event().await, DriverEvent::NativeDetached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_driver_never_fires() {
        let mut driver = None;
        let result = tokio::time::timeout(Duration::from_secs(60), next_driver_event(&mut driver)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_dropping_native_driver_detaches_listener() {
        let (tx, rx) = mpsc::unbounded_channel::<BackendEvent>();
        let driver = ActiveDriver::Native(rx);
        assert!(!tx.is_closed());
        drop(driver);
        assert!(tx.is_closed());
    }
}
