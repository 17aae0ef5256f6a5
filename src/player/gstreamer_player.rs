use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use gstreamer as gst;
use gstreamer::prelude::*;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::traits::{BackendEvent, BackendEvents, MediaBackend};

const STATE_CHANGE_TIMEOUT_SECS: u64 = 5;
const POSITION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Native backend on top of a GStreamer `playbin`.
///
/// Position is polled once a second and forwarded together with
/// end-of-stream; a pipeline error ends the poller, which closes the
/// listener.
pub struct GStreamerBackend {
    playbin: Option<gst::Element>,
    loaded_uri: Option<String>,
    poller: Option<JoinHandle<()>>,
}

impl GStreamerBackend {
    pub fn new() -> Result<Self> {
        gst::init().context("Failed to initialize GStreamer")?;
        info!("GStreamer {} initialized", gst::version_string());
        Ok(Self {
            playbin: None,
            loaded_uri: None,
            poller: None,
        })
    }

    fn playbin_for(&mut self, source_uri: &str) -> Result<gst::Element> {
        if let (Some(playbin), Some(loaded)) = (&self.playbin, &self.loaded_uri) {
            if loaded == source_uri {
                return Ok(playbin.clone());
            }
        }

        self.release_pipeline();

        debug!("Creating playbin for {}", source_uri);
        let playbin = gst::ElementFactory::make("playbin")
            .name("mindful-playbin")
            .property("uri", source_uri)
            .build()
            .context("Failed to create playbin element - GStreamer plugins may not be installed")?;

        self.playbin = Some(playbin.clone());
        self.loaded_uri = Some(source_uri.to_string());
        Ok(playbin)
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }

    fn release_pipeline(&mut self) {
        self.stop_poller();
        if let Some(playbin) = self.playbin.take() {
            if let Err(e) = playbin.set_state(gst::State::Null) {
                warn!("Failed to set playbin to null state: {:?}", e);
            }
        }
        self.loaded_uri = None;
    }

    /// Pull the first error off the bus, if any
    fn pending_bus_error(playbin: &gst::Element) -> Option<String> {
        let bus = playbin.bus()?;
        while let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error]) {
            if let gst::MessageView::Error(err) = msg.view() {
                return Some(format!("{} ({:?})", err.error(), err.debug()));
            }
        }
        None
    }

    fn spawn_poller(playbin: gst::Element) -> (JoinHandle<()>, BackendEvents) {
        let (tx, rx) = mpsc::unbounded_channel();

        let poller = tokio::spawn(async move {
            let mut interval = tokio::time::interval(POSITION_POLL_INTERVAL);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }

                if let Some(bus) = playbin.bus() {
                    if let Some(msg) =
                        bus.pop_filtered(&[gst::MessageType::Eos, gst::MessageType::Error])
                    {
                        match msg.view() {
                            gst::MessageView::Eos(_) => {
                                debug!("playbin reached end of stream");
                                let _ = tx.send(BackendEvent::Ended);
                            }
                            gst::MessageView::Error(err) => {
                                error!("playbin error: {} ({:?})", err.error(), err.debug());
                            }
                            _ => {}
                        }
                        break;
                    }
                }

                if let Some(position) = playbin.query_position::<gst::ClockTime>() {
                    let position = Duration::from_nanos(position.nseconds());
                    if tx.send(BackendEvent::TimeUpdate { position }).is_err() {
                        break;
                    }
                }
            }
        });

        (poller, rx)
    }
}

#[async_trait]
impl MediaBackend for GStreamerBackend {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    async fn attempt_start(&mut self, source_uri: &str) -> Result<BackendEvents> {
        let playbin = self.playbin_for(source_uri)?;

        playbin
            .set_state(gst::State::Playing)
            .context("Failed to set playbin to playing state")?;

        let (result, state, _) =
            playbin.state(gst::ClockTime::from_seconds(STATE_CHANGE_TIMEOUT_SECS));
        if result.is_err() || state != gst::State::Playing {
            let reason = Self::pending_bus_error(&playbin)
                .unwrap_or_else(|| format!("pipeline stuck in {:?}", state));
            self.release_pipeline();
            return Err(anyhow!("playbin did not start: {}", reason));
        }

        self.stop_poller();
        let (poller, events) = Self::spawn_poller(playbin);
        self.poller = Some(poller);
        Ok(events)
    }

    async fn pause(&mut self) -> Result<()> {
        self.stop_poller();
        if let Some(playbin) = self.playbin.as_ref() {
            playbin
                .set_state(gst::State::Paused)
                .context("Failed to set playbin to paused state")?;
        }
        Ok(())
    }

    async fn set_position(&mut self, position: Duration) -> Result<()> {
        let playbin = self
            .playbin
            .as_ref()
            .ok_or_else(|| anyhow!("No playbin available for seeking"))?;

        let target = gst::ClockTime::from_nseconds(position.as_nanos() as u64);
        playbin
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)
            .context("Failed to seek")?;
        Ok(())
    }

    async fn set_volume_level(&mut self, level: f64) -> Result<()> {
        if let Some(playbin) = self.playbin.as_ref() {
            playbin.set_property("volume", level.clamp(0.0, 1.0));
        }
        Ok(())
    }
}

impl Drop for GStreamerBackend {
    fn drop(&mut self) {
        self.release_pipeline();
    }
}
