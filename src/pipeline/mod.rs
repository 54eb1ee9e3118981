pub mod camera;
pub mod capture;
pub mod detector;
pub mod mailbox;
pub mod overlay;
pub mod rgba_converter;

// Re-exports for convenience
pub use camera::FrameSource;
#[cfg(feature = "camera-nokhwa")]
pub use camera::{NokhwaSource, available_cameras};
pub use capture::{CaptureError, CaptureLoop};
pub use detector::{FACE_DETECT_PARAMS, FaceLocator, HaarCascadeLocator};
pub use mailbox::{MailboxReceiver, latest_only};
