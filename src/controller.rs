use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};

use crate::{
    config::AppConfig,
    pipeline::{
        CaptureError, CaptureLoop, FACE_DETECT_PARAMS, FaceLocator, FrameSource, MailboxReceiver,
        latest_only,
    },
    storage::{
        LoginEvent, RegisterOutcome, RegistrationForm, RegistryStore, SessionLog,
        SessionLogError,
    },
    types::AnnotatedFrame,
};

pub const INITIAL_MODEL_TEXT: &str = "Hello, MVC with DI!";
pub const FETCHED_MODEL_TEXT: &str = "Data fetched from Model!";

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: String,
}

impl Default for AppModel {
    fn default() -> Self {
        Self {
            data: INITIAL_MODEL_TEXT.to_string(),
        }
    }
}

/// Routes UI events to the capture loop and the two flat files.
pub struct Controller {
    model: AppModel,
    capture: CaptureLoop,
    registry: RegistryStore,
    session_log: SessionLog,
    operator: String,
}

impl Controller {
    pub fn model(&self) -> &AppModel {
        &self.model
    }

    pub fn fetch_data(&mut self) -> &str {
        self.model.data = FETCHED_MODEL_TEXT.to_string();
        log::info!("{}", self.model.data);
        &self.model.data
    }

    pub fn start_camera(&self) -> Result<(), CaptureError> {
        self.capture.start()
    }

    pub fn stop_camera(&self) {
        self.capture.stop();
    }

    pub fn camera_running(&self) -> bool {
        self.capture.is_running()
    }

    pub fn handle_login(&self) -> Result<LoginEvent, SessionLogError> {
        match self.session_log.record_login(&self.operator) {
            Ok(event) => {
                log::info!(
                    "login recorded in {}: {event}",
                    self.session_log.path().display()
                );
                Ok(event)
            }
            Err(err) => {
                log::error!("login not recorded: {err}");
                Err(err)
            }
        }
    }

    pub fn handle_register(&self, form: &RegistrationForm) -> RegisterOutcome {
        self.registry.register(form)
    }
}

/// Everything the window needs: the controller and the receiving end of the
/// frame mailbox.
pub struct Assembly {
    pub controller: Controller,
    pub frames: MailboxReceiver<AnnotatedFrame>,
}

/// Builds every component before anything is wired to the view, so the view
/// can take a finished controller instead of being patched afterwards.
pub struct AppBuilder {
    config: AppConfig,
    source: Option<Arc<dyn FrameSource>>,
    locator: Option<Box<dyn FaceLocator>>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            source: None,
            locator: None,
        }
    }

    pub fn frame_source(mut self, source: impl FrameSource) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn face_locator(mut self, locator: impl FaceLocator) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    pub fn build(self) -> Result<Assembly> {
        let source = self
            .source
            .ok_or_else(|| anyhow!("no frame source configured"))?;
        let locator = self
            .locator
            .ok_or_else(|| anyhow!("no face locator configured"))?;

        let registry = RegistryStore::open(&self.config.users_path).with_context(|| {
            format!(
                "failed to prepare user registry {}",
                self.config.users_path.display()
            )
        })?;
        match registry.records() {
            Ok(records) => log::info!(
                "user registry {} holds {} record(s)",
                registry.path().display(),
                records.len()
            ),
            Err(err) => log::warn!("user registry is not readable: {err}"),
        }
        let session_log = SessionLog::new(&self.config.log_path);

        let (frame_tx, frames) = latest_only();
        let capture = CaptureLoop::new(
            source,
            Arc::new(Mutex::new(locator)),
            self.config.camera_index,
            FACE_DETECT_PARAMS,
            frame_tx,
        );

        let controller = Controller {
            model: AppModel::default(),
            capture,
            registry,
            session_log,
            operator: self.config.operator,
        };

        Ok(Assembly { controller, frames })
    }
}
