//! Display Refresh Loop
//!
//! Drives a [`ResponseDisplay`] at a fixed rate on its own thread and ships
//! every repaint to the render side as an [`Event::Frame`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};
use triband_dsp::{Bounds, Channel};

use crate::display::ResponseDisplay;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;

pub struct RefreshLoop {
    thread: Option<JoinHandle<ResponseDisplay>>,
    shutdown_flag: Arc<AtomicBool>,
}

impl RefreshLoop {
    /// Move `display` onto a new thread ticking `refresh_hz` times a second
    pub fn spawn(
        display: ResponseDisplay,
        bounds: Bounds,
        refresh_hz: u32,
        sender: Sender<Event>,
    ) -> EngineResult<Self> {
        if refresh_hz == 0 {
            return Err(EngineError::ConfigError("Refresh rate must be non-zero".into()));
        }

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown_flag);

        let thread = thread::Builder::new()
            .name("triband-refresh".into())
            .spawn(move || Self::refresh_thread_main(display, bounds, refresh_hz, sender, shutdown_clone))
            .map_err(|e| EngineError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            thread: Some(thread),
            shutdown_flag,
        })
    }

    fn refresh_thread_main(
        mut display: ResponseDisplay,
        bounds: Bounds,
        refresh_hz: u32,
        sender: Sender<Event>,
        shutdown_flag: Arc<AtomicBool>,
    ) -> ResponseDisplay {
        let period = Duration::from_secs_f64(1.0 / refresh_hz as f64);
        let mut reported = [0_u64; 2];

        info!("Refresh loop started at {} Hz", refresh_hz);
        let _ = sender.send(Event::Started { refresh_hz });

        while !shutdown_flag.load(Ordering::Acquire) {
            let started = Instant::now();

            if display.tick(bounds) {
                let frame = Event::Frame {
                    response: display.current_response().clone(),
                    left: display.left_path().clone(),
                    right: display.right_path().clone(),
                };
                if sender.send(frame).is_err() {
                    debug!("Frame receiver dropped, stopping refresh loop");
                    break;
                }
            }

            for (slot, channel) in reported.iter_mut().zip([Channel::Left, Channel::Right]) {
                let count = display.dropped_blocks(channel);
                if count > *slot {
                    warn!("Analyzer dropped {} blocks on {:?}", count - *slot, channel);
                    *slot = count;
                    let _ = sender.send(Event::AnalyzerDropped { channel, count });
                }
            }

            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        let _ = sender.send(Event::Stopped);
        info!("Refresh loop stopped");
        display
    }

    /// Signal the thread to finish and wait for it
    ///
    /// Returns the display so it can be restarted or inspected.
    pub fn stop(&mut self) -> EngineResult<ResponseDisplay> {
        let handle = self.thread.take().ok_or(EngineError::AlreadyStopped)?;
        self.shutdown_flag.store(true, Ordering::Release);
        handle.join().map_err(|_| EngineError::ThreadPanicked)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        // Signal shutdown
        self.shutdown_flag.store(true, Ordering::Release);

        // Wait for refresh thread to finish
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
