use crate::{CompressedFrame, FrameBroadcaster, PumpError};
use camcast_base::Resolution;
use camcast_capture::{
    CaptureConfig, CaptureDevice, CaptureError, DeviceGuard, FrameFormat, PixelFormat,
};
use camcast_image::{ImageError, yuyv_to_jpeg};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, spawn_blocking};
use tokio::time::{Instant, MissedTickBehavior};

// pause after a non-transient capture error, so a broken device does not
// spin the worker
const ERROR_BACKOFF_MS: u64 = 100;

type BoxedDevice = Box<dyn CaptureDevice>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug)]
struct Status {
    state: PumpState,
    format: Option<FrameFormat>,
}

// a running capture session
struct Session {
    stop: oneshot::Sender<()>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<Result<BoxedDevice, PumpError>>,
}

struct Lifecycle {
    config: CaptureConfig,
    // parked here while no session owns it
    device: Option<BoxedDevice>,
    session: Option<Session>,
}

/// Drives one capture device: acquire, convert, publish.
///
/// While running, a blocking worker waits on the device, converts each raw
/// frame to JPEG and keeps only the newest result. A separate timer task
/// publishes that result to the [`FrameBroadcaster`] once per
/// `1000 / fps` milliseconds, so the published rate does not follow the
/// device's own pace. A stop request always takes priority over a pending
/// publish.
///
/// `start`, `stop` and `reconfigure` are serialized; at most one session
/// exists at a time.
pub struct FramePump {
    broadcaster: FrameBroadcaster,
    status: Mutex<Status>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
}

impl std::fmt::Debug for FramePump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePump")
            .field("state", &self.state())
            .field("format", &self.format())
            .field("broadcaster", &self.broadcaster)
            .finish()
    }
}

impl FramePump {
    pub fn new(
        device: impl CaptureDevice + 'static,
        config: CaptureConfig,
        broadcaster: FrameBroadcaster,
    ) -> Self {
        Self {
            broadcaster,
            status: Mutex::new(Status {
                state: PumpState::Idle,
                format: None,
            }),
            lifecycle: tokio::sync::Mutex::new(Lifecycle {
                config,
                device: Some(Box::new(device)),
                session: None,
            }),
        }
    }

    pub fn broadcaster(&self) -> &FrameBroadcaster {
        &self.broadcaster
    }

    pub fn state(&self) -> PumpState {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// The format negotiated by the running session.
    pub fn format(&self) -> Option<FrameFormat> {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).format
    }

    /// Resolution the device actually delivers, which may differ from the
    /// configured one.
    pub fn resolution(&self) -> Option<Resolution> {
        self.format().map(|format| format.resolution)
    }

    pub async fn config(&self) -> CaptureConfig {
        self.lifecycle.lock().await.config.clone()
    }

    fn set_status(&self, state: PumpState, format: Option<FrameFormat>) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        status.state = state;
        status.format = format;
    }

    fn set_state(&self, state: PumpState) {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).state = state;
    }

    /// Open the device and begin capturing.
    ///
    /// Returns the negotiated format. Calling this while a session is
    /// already running does nothing and returns the running session's
    /// format.
    ///
    /// # Errors
    ///
    /// Returns `PumpError::Capture` if the device cannot be opened, does
    /// not accept the format, or fails to start streaming; the pump stays
    /// idle and the device is released. Returns `PumpError::Worker` if a
    /// previous worker died and took the device with it.
    pub async fn start(&self) -> Result<FrameFormat, PumpError> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.start_locked(&mut lifecycle).await
    }

    async fn start_locked(&self, lifecycle: &mut Lifecycle) -> Result<FrameFormat, PumpError> {
        if lifecycle.session.is_some() {
            log::info!("video capture already running");
            return self
                .format()
                .ok_or_else(|| PumpError::Worker("running session has no format".to_string()));
        }

        let device = lifecycle
            .device
            .take()
            .ok_or_else(|| PumpError::Worker("capture device was lost".to_string()))?;

        self.set_state(PumpState::Starting);

        let config = lifecycle.config.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let (held_tx, held_rx) = watch::channel::<Option<CompressedFrame>>(None);
        let (init_tx, init_rx) = oneshot::channel::<Result<FrameFormat, CaptureError>>();

        // the device is opened on the worker thread, which then owns it until
        // the session ends and hands it back through the join handle
        let worker = spawn_blocking({
            let config = config.clone();
            let cancel = Arc::clone(&cancel);
            move || capture_worker(device, config, cancel, init_tx, held_tx)
        });

        let format = match init_rx.await {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                log::error!("failed to start video capture on {}: {}", config.device(), e);
                lifecycle.device = worker.await.ok();
                self.set_status(PumpState::Idle, None);
                return Err(PumpError::Capture(e));
            }
            Err(_) => {
                self.set_status(PumpState::Idle, None);
                return Err(PumpError::Worker(
                    "capture worker died during start".to_string(),
                ));
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(publish_loop(
            stop_rx,
            config.publish_period(),
            held_rx,
            self.broadcaster.clone(),
            Arc::clone(&cancel),
            worker,
        ));

        lifecycle.session = Some(Session {
            stop: stop_tx,
            cancel,
            task,
        });
        self.set_status(PumpState::Running, Some(format));

        log::info!(
            "started video capture on {}: {:?} {} at {} fps",
            config.device(),
            format.pixel_format,
            format.resolution,
            config.fps()
        );

        Ok(format)
    }

    /// Stop capturing and release the device.
    ///
    /// Returns once the worker has stopped streaming and closed the device,
    /// which takes at most one wait timeout. Does nothing if the pump is
    /// idle.
    ///
    /// # Errors
    ///
    /// Returns `PumpError::Worker` if the session's tasks panicked; the pump
    /// is idle afterwards but the device is gone.
    pub async fn stop(&self) -> Result<(), PumpError> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await
    }

    async fn stop_locked(&self, lifecycle: &mut Lifecycle) -> Result<(), PumpError> {
        let Some(session) = lifecycle.session.take() else {
            log::debug!("video capture not running, nothing to stop");
            return Ok(());
        };

        self.set_state(PumpState::Stopping);

        // the publish task may already be gone if it panicked
        let _ = session.stop.send(());

        let result = match session.task.await {
            Ok(Ok(device)) => {
                lifecycle.device = Some(device);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(PumpError::Worker(e.to_string())),
        };

        self.set_status(PumpState::Idle, None);
        log::info!("stopped video capture");
        result
    }

    /// Replace the configuration, restarting the session if one is running.
    ///
    /// Returns the newly negotiated format when a session was (re)started.
    /// The new configuration is kept even if stopping the old session fails,
    /// in which case the pump is left idle and the stop error is returned.
    pub async fn reconfigure(
        &self,
        config: CaptureConfig,
    ) -> Result<Option<FrameFormat>, PumpError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let was_running = lifecycle.session.is_some();

        let stopped = self.stop_locked(&mut lifecycle).await;
        lifecycle.config = config;
        stopped?;

        if was_running {
            return self.start_locked(&mut lifecycle).await.map(Some);
        }
        Ok(None)
    }
}

impl Drop for FramePump {
    fn drop(&mut self) {
        // dropping the stop sender also ends the publish task, which then
        // joins the worker; the flag makes the worker quit at its next check
        if let Some(session) = self.lifecycle.get_mut().session.as_ref() {
            session.cancel.store(true, Ordering::Relaxed);
        }
    }
}

/// Publish the held frame on every tick until told to stop, then shut the
/// worker down and return its device.
async fn publish_loop(
    mut stop: oneshot::Receiver<()>,
    period: Duration,
    held: watch::Receiver<Option<CompressedFrame>>,
    broadcaster: FrameBroadcaster,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<BoxedDevice>,
) -> Result<BoxedDevice, PumpError> {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // an explicit stop and a dropped pump both end the session
            _ = &mut stop => break,

            _ = ticker.tick() => {
                let frame = held.borrow().clone();
                match frame {
                    Some(frame) => broadcaster.publish(frame),
                    None => log::debug!("no frame converted yet, skipping publish"),
                }
            }
        }
    }

    cancel.store(true, Ordering::Relaxed);
    worker
        .await
        .map_err(|e| PumpError::Worker(format!("capture worker failed: {e}")))
}

/// Blocking side of a session: start the device, then acquire and convert
/// frames until cancelled. Always hands the device back.
fn capture_worker(
    mut device: BoxedDevice,
    config: CaptureConfig,
    cancel: Arc<AtomicBool>,
    init: oneshot::Sender<Result<FrameFormat, CaptureError>>,
    held: watch::Sender<Option<CompressedFrame>>,
) -> BoxedDevice {
    run_session(&mut device, &config, &cancel, init, &held);
    device
}

fn run_session(
    device: &mut BoxedDevice,
    config: &CaptureConfig,
    cancel: &AtomicBool,
    init: oneshot::Sender<Result<FrameFormat, CaptureError>>,
    held: &watch::Sender<Option<CompressedFrame>>,
) {
    let mut guard = match DeviceGuard::start(device, config) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = init.send(Err(e));
            return;
        }
    };

    let format = guard.format();
    if init.send(Ok(format)).is_err() {
        // start() was abandoned; the guard releases the device
        return;
    }

    let timeout = config.wait_timeout();

    while !cancel.load(Ordering::Relaxed) {
        let raw = match guard.wait_for_frame(timeout) {
            Ok(()) if cancel.load(Ordering::Relaxed) => break,
            Ok(()) => guard.read_frame(),
            Err(e) => Err(e),
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) if e.is_transient() => {
                log::warn!("skipping frame from {}: {}", config.device(), e);
                continue;
            }
            Err(e) => {
                log::warn!("capture device {} failed: {}", config.device(), e);
                std::thread::sleep(Duration::from_millis(ERROR_BACKOFF_MS));
                continue;
            }
        };

        match convert_frame(raw, format) {
            // the previous frame stays held when conversion fails
            Ok(jpeg) => {
                held.send_replace(Some(jpeg));
            }
            Err(e) => log::warn!("failed to convert frame: {}", e),
        }
    }

    log::debug!("capture worker for {} exiting", config.device());
}

fn convert_frame(raw: Vec<u8>, format: FrameFormat) -> Result<CompressedFrame, ImageError> {
    match format.pixel_format {
        PixelFormat::Yuyv => yuyv_to_jpeg(&raw, format.resolution).map(Into::into),
        // already compressed by the device
        PixelFormat::Mjpeg => Ok(raw.into()),
    }
}
