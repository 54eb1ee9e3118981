pub mod registry;
pub mod session_log;

pub use registry::{RegisterOutcome, RegistrationForm, RegistryStore};
pub use session_log::{LoginEvent, SessionLog, SessionLogError, parse_display_name};
