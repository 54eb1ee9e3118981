use anyhow::Result;

use crate::types::Frame;

/// Opens camera devices. Devices are created, read and released on the
/// capture thread, so they do not need to be `Send`.
pub trait FrameSource: Send + Sync + 'static {
    fn open(&self, device_index: u32) -> Result<Box<dyn CameraDevice>>;
}

pub trait CameraDevice {
    /// Returns `None` when no frame is available right now; the caller retries.
    fn read_frame(&mut self) -> Option<Frame>;

    fn release(self: Box<Self>);
}

#[cfg(feature = "camera-nokhwa")]
pub use self::native::{CameraListing, NokhwaSource, available_cameras};

#[cfg(feature = "camera-nokhwa")]
mod native {
    use anyhow::{Result, anyhow};
    use nokhwa::{
        Camera,
        pixel_format::RgbFormat,
        query,
        utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    };

    use super::{CameraDevice, FrameSource};
    use crate::{pipeline::rgba_converter, types::Frame};

    // Prefer pixel formats that are widely supported on macOS (the built-in cameras
    // often reject YUYV even though Nokhwa reports it).
    const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
        FrameFormat::RAWRGB,
        FrameFormat::RAWBGR,
        FrameFormat::GRAY,
        FrameFormat::YUYV,
        FrameFormat::NV12,
        FrameFormat::MJPEG,
    ];

    fn requested_formats() -> [RequestedFormat<'static>; 3] {
        [
            RequestedFormat::with_formats(
                RequestedFormatType::AbsoluteHighestFrameRate,
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        ]
    }

    #[derive(Clone, Debug)]
    pub struct CameraListing {
        pub index: u32,
        pub label: String,
    }

    pub fn available_cameras() -> Result<Vec<CameraListing>> {
        let cameras = query(ApiBackend::Auto)?;
        Ok(cameras
            .into_iter()
            .enumerate()
            .map(|(position, info)| CameraListing {
                index: info.index().as_index().unwrap_or(position as u32),
                label: info.human_name(),
            })
            .collect())
    }

    #[derive(Clone, Copy, Debug, Default)]
    pub struct NokhwaSource;

    impl FrameSource for NokhwaSource {
        fn open(&self, device_index: u32) -> Result<Box<dyn CameraDevice>> {
            let index = CameraIndex::Index(device_index);
            let mut last_err = None;

            for requested in requested_formats() {
                match Camera::new(index.clone(), requested) {
                    Ok(mut camera) => match camera.open_stream() {
                        Ok(()) => {
                            log::info!(
                                "opened camera {device_index} at {}",
                                camera.resolution()
                            );
                            return Ok(Box::new(NokhwaDevice { camera }));
                        }
                        Err(err) => last_err = Some(err.into()),
                    },
                    Err(err) => last_err = Some(err.into()),
                }
            }

            Err(last_err.unwrap_or_else(|| {
                anyhow!("failed to open camera {device_index} with any supported format")
            }))
        }
    }

    struct NokhwaDevice {
        camera: Camera,
    }

    impl CameraDevice for NokhwaDevice {
        fn read_frame(&mut self) -> Option<Frame> {
            let buffer = match self.camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!("camera frame read failed: {err:?}");
                    return None;
                }
            };

            match rgba_converter::convert_camera_frame(&buffer) {
                Ok(frame) if !frame.rgba.is_empty() => Some(frame),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    None
                }
            }
        }

        fn release(mut self: Box<Self>) {
            if let Err(err) = self.camera.stop_stream() {
                log::warn!("failed to stop camera stream: {err:?}");
            }
        }
    }
}
