use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, Context, IntoElement, ObjectFit,
    ParentElement, SIDE_PANEL_FRACTION, StatusLine, Styled, StyledExt, StyledImage, div, h_flex,
    img, px, relative, v_flex,
};

impl AppView {
    pub(super) fn render_main(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let header = div()
            .w_full()
            .py_2()
            .flex()
            .justify_center()
            .bg(gpui::rgb(0xadd8e6))
            .text_color(gpui::rgb(0x1a2332))
            .font_semibold()
            .child("Face Kiosk");

        let footer = div()
            .w_full()
            .py_1()
            .flex()
            .justify_center()
            .bg(gpui::rgb(0xd3d3d3))
            .text_xs()
            .text_color(gpui::rgb(0x1a2332))
            .child(self.controller.model().data.clone());

        let body = h_flex()
            .flex_1()
            .w_full()
            .gap_1()
            .p_1()
            .items_start()
            .child(self.render_sidebar(cx))
            .child(self.render_camera_panel())
            .child(self.render_profile(cx));

        v_flex()
            .size_full()
            .bg(gpui::rgb(0x1a2332))
            .child(header)
            .child(body)
            .child(footer)
            .into_any_element()
    }

    fn render_sidebar(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let camera_label = if self.controller.camera_running() {
            "Stop Camera"
        } else {
            "Start Camera"
        };

        let mut sidebar = v_flex()
            .w(relative(SIDE_PANEL_FRACTION))
            .h_full()
            .gap_3()
            .p_3()
            .rounded_lg()
            .bg(gpui::rgb(0x90ee90))
            .child(
                Button::new("login")
                    .primary()
                    .label("Login")
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.login();
                        cx.notify();
                    })),
            )
            .child(
                Button::new("camera-toggle")
                    .outline()
                    .label(camera_label)
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.toggle_camera();
                        cx.notify();
                    })),
            )
            .child(
                Button::new("fetch-data")
                    .outline()
                    .label("Fetch Data")
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.fetch_data();
                        cx.notify();
                    })),
            )
            .child(status_text(&self.camera_status, cx));

        if let Some(status) = &self.sidebar_status {
            sidebar = sidebar.child(status_text(status, cx));
        }

        sidebar.into_any_element()
    }

    fn render_camera_panel(&self) -> AnyElement {
        let surface: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .child("Waiting for camera...")
                .into_any_element()
        };

        let frame_status = self
            .latest_frame_info
            .map(|info| {
                format!(
                    "{}x{} · {} face(s)",
                    info.width, info.height, info.faces
                )
            })
            .unwrap_or_else(|| "No frames yet".to_string());

        v_flex()
            .flex_1()
            .h_full()
            .min_h(px(240.0))
            .rounded_lg()
            .overflow_hidden()
            .bg(gpui::rgb(0x000000))
            .child(div().flex_1().w_full().child(surface))
            .child(
                div()
                    .p_2()
                    .text_xs()
                    .text_color(gpui::rgb(0xa0aab8))
                    .child(frame_status),
            )
            .into_any_element()
    }
}

pub(super) fn status_text(status: &StatusLine, cx: &Context<'_, AppView>) -> AnyElement {
    let theme = cx.theme();
    let color = if status.ok { theme.success } else { theme.danger };
    div()
        .text_sm()
        .text_color(color)
        .child(status.text.clone())
        .into_any_element()
}
