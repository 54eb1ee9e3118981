use std::sync::Arc;

use gpui::{
    AnyElement, App, AppContext, Context, Entity, IntoElement, ObjectFit, ParentElement, Render,
    RenderImage, SharedString, Styled, StyledImage, TitlebarOptions, Window, WindowOptions, div,
    img, px, relative,
};
use gpui_component::{
    ActiveTheme, Root, StyledExt,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputState},
    v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    controller::{Assembly, Controller},
    pipeline::MailboxReceiver,
    types::AnnotatedFrame,
};

mod main_view;
mod profile;
mod render_util;

const DEFAULT_PHOTO_DIR: &str = "photos/user_0001";
const SIDE_PANEL_FRACTION: f32 = 0.25;

pub fn launch_ui(app: &mut App, assembly: Assembly) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Face Kiosk".into()),
            ..Default::default()
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| AppView::new(assembly, window, cx));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    controller: Controller,
    frames: MailboxReceiver<AnnotatedFrame>,
    latest_image: Option<Arc<RenderImage>>,
    latest_frame_info: Option<FrameInfo>,
    camera_status: StatusLine,
    sidebar_status: Option<StatusLine>,
    register_status: Option<StatusLine>,
    form: RegistrationInputs,
}

#[derive(Clone, Copy)]
struct FrameInfo {
    width: u32,
    height: u32,
    faces: usize,
}

#[derive(Clone)]
struct StatusLine {
    text: SharedString,
    ok: bool,
}

impl StatusLine {
    fn ok(text: impl Into<SharedString>) -> Self {
        Self {
            text: text.into(),
            ok: true,
        }
    }

    fn error(text: impl Into<SharedString>) -> Self {
        Self {
            text: text.into(),
            ok: false,
        }
    }
}

struct RegistrationInputs {
    user_id: Entity<InputState>,
    first_name: Entity<InputState>,
    last_name: Entity<InputState>,
    photo_dir: Entity<InputState>,
}

impl RegistrationInputs {
    fn new(window: &mut Window, cx: &mut Context<'_, AppView>) -> Self {
        Self {
            user_id: cx.new(|cx| InputState::new(window, cx).placeholder("User ID")),
            first_name: cx.new(|cx| InputState::new(window, cx).placeholder("First Name")),
            last_name: cx.new(|cx| InputState::new(window, cx).placeholder("Last Name")),
            photo_dir: cx.new(|cx| {
                InputState::new(window, cx)
                    .placeholder("Photo Dir")
                    .default_value(DEFAULT_PHOTO_DIR)
            }),
        }
    }
}

impl AppView {
    fn new(assembly: Assembly, window: &mut Window, cx: &mut Context<'_, Self>) -> Self {
        let Assembly { controller, frames } = assembly;
        let form = RegistrationInputs::new(window, cx);

        // Opening the device can block while formats are negotiated; let the
        // window show first.
        cx.defer_in(window, |this, _, cx| {
            this.start_camera();
            cx.notify();
        });

        Self {
            controller,
            frames,
            latest_image: None,
            latest_frame_info: None,
            camera_status: StatusLine::ok("Starting camera..."),
            sidebar_status: None,
            register_status: None,
            form,
        }
    }

    fn start_camera(&mut self) {
        self.camera_status = match self.controller.start_camera() {
            Ok(()) => StatusLine::ok("Camera running"),
            Err(err) => {
                log::error!("{err}");
                StatusLine::error(err.to_string())
            }
        };
    }

    fn toggle_camera(&mut self) {
        if self.controller.camera_running() {
            self.controller.stop_camera();
            self.camera_status = StatusLine::ok("Camera stopped");
        } else {
            self.start_camera();
        }
    }

    fn login(&mut self) {
        self.sidebar_status = Some(match self.controller.handle_login() {
            Ok(event) => StatusLine::ok(format!("Login recorded: {event}")),
            Err(err) => StatusLine::error(format!("Login failed: {err}")),
        });
    }

    fn fetch_data(&mut self) {
        let data = self.controller.fetch_data().to_string();
        self.sidebar_status = Some(StatusLine::ok(data));
    }
}

impl Render for AppView {
    fn render(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) -> impl IntoElement {
        // Keep repainting so new camera frames show up without a UI event.
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.drain_frames(window, cx);
        self.render_main(cx)
    }
}
