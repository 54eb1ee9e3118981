use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use crossbeam_channel::bounded;
use thiserror::Error;

use super::{
    camera::{CameraDevice, FrameSource},
    detector::{DetectParams, FaceLocator},
    mailbox::MailboxSender,
    overlay, rgba_converter,
};
use crate::types::{AnnotatedFrame, Frame};

pub const READ_RETRY_BACKOFF: Duration = Duration::from_millis(50);
pub const FRAME_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open camera {index}: {source}")]
    Open {
        index: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("capture thread exited before reporting camera state")]
    ThreadLost,
}

pub type SharedLocator = Arc<Mutex<Box<dyn FaceLocator>>>;

#[derive(Debug)]
struct CaptureStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureStream {
    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Owns the camera for as long as it runs. Start and stop are serialized
/// through `stream`, so concurrent callers never open a second device.
pub struct CaptureLoop {
    source: Arc<dyn FrameSource>,
    locator: SharedLocator,
    device_index: u32,
    params: DetectParams,
    sink: MailboxSender<AnnotatedFrame>,
    stream: Mutex<Option<CaptureStream>>,
}

impl CaptureLoop {
    pub fn new(
        source: Arc<dyn FrameSource>,
        locator: SharedLocator,
        device_index: u32,
        params: DetectParams,
        sink: MailboxSender<AnnotatedFrame>,
    ) -> Self {
        Self {
            source,
            locator,
            device_index,
            params,
            sink,
            stream: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(CaptureStream::is_running)
    }

    /// Opens the camera on a fresh capture thread. A no-op while already running.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(CaptureStream::is_running) {
            log::debug!("capture loop already running");
            return Ok(());
        }
        // Reap a loop that ended on its own.
        if let Some(mut finished) = slot.take() {
            finished.shutdown();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = bounded::<Result<(), anyhow::Error>>(1);
        let worker = Worker {
            source: self.source.clone(),
            locator: self.locator.clone(),
            device_index: self.device_index,
            params: self.params,
            sink: self.sink.clone(),
            stop: stop.clone(),
        };

        let handle = thread::Builder::new()
            .name("capture-loop".into())
            .spawn(move || worker.run(ready_tx))
            .map_err(CaptureError::Spawn)?;

        let mut stream = CaptureStream {
            stop,
            handle: Some(handle),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("capture loop started on camera {}", self.device_index);
                *slot = Some(stream);
                Ok(())
            }
            Ok(Err(source)) => {
                stream.shutdown();
                Err(CaptureError::Open {
                    index: self.device_index,
                    source,
                })
            }
            Err(_) => {
                stream.shutdown();
                Err(CaptureError::ThreadLost)
            }
        }
    }

    /// Signals the loop to finish and waits for it to release the camera.
    /// Safe to call when nothing is running.
    pub fn stop(&self) {
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut stream) = stream {
            stream.shutdown();
            log::info!("capture loop stopped");
        }
    }
}

struct Worker {
    source: Arc<dyn FrameSource>,
    locator: SharedLocator,
    device_index: u32,
    params: DetectParams,
    sink: MailboxSender<AnnotatedFrame>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, ready_tx: crossbeam_channel::Sender<Result<(), anyhow::Error>>) {
        let mut device = match self.source.open(self.device_index) {
            Ok(device) => {
                let _ = ready_tx.send(Ok(()));
                device
            }
            Err(err) => {
                let _ = ready_tx.send(Err(err));
                return;
            }
        };

        while !self.stop.load(Ordering::Relaxed) {
            let Some(frame) = device.read_frame() else {
                thread::sleep(READ_RETRY_BACKOFF);
                continue;
            };

            self.sink.publish(self.annotate(frame));
            thread::sleep(FRAME_INTERVAL);
        }

        device.release();
    }

    fn annotate(&self, mut frame: Frame) -> AnnotatedFrame {
        let gray = rgba_converter::rgba_to_gray(&frame);
        let faces = {
            let mut locator = self.locator.lock().unwrap_or_else(PoisonError::into_inner);
            match locator.detect(&gray, &self.params) {
                Ok(faces) => faces,
                Err(err) => {
                    log::warn!("face detection failed: {err}");
                    Vec::new()
                }
            }
        };

        overlay::draw_face_squares(&mut frame.rgba, frame.width, frame.height, &faces);
        AnnotatedFrame { frame, faces }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
