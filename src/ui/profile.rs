use super::{
    AnyElement, App, AppView, Button, ButtonVariants, Context, Entity, Input, InputState,
    IntoElement, ParentElement, SIDE_PANEL_FRACTION, StatusLine, Styled, StyledExt, Window, div,
    h_flex, main_view, relative, v_flex,
};
use crate::storage::RegistrationForm;

impl AppView {
    pub(super) fn render_profile(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let mut panel = v_flex()
            .w(relative(SIDE_PANEL_FRACTION))
            .h_full()
            .gap_2()
            .p_3()
            .rounded_lg()
            .bg(gpui::rgb(0xffb6c1))
            .child(
                div()
                    .text_color(gpui::rgb(0x1a2332))
                    .font_semibold()
                    .child("Register User"),
            )
            .child(form_row("User ID:", &self.form.user_id))
            .child(form_row("First Name:", &self.form.first_name))
            .child(form_row("Last Name:", &self.form.last_name))
            .child(form_row("Photo Dir:", &self.form.photo_dir))
            .child(
                Button::new("register")
                    .primary()
                    .label("Register")
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.submit_registration(window, cx);
                        cx.notify();
                    })),
            );

        if let Some(status) = &self.register_status {
            panel = panel.child(main_view::status_text(status, cx));
        }

        panel.into_any_element()
    }

    fn submit_registration(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let form = RegistrationForm {
            user_id: input_value(&self.form.user_id, cx),
            first_name: input_value(&self.form.first_name, cx),
            last_name: input_value(&self.form.last_name, cx),
            photo_dir: input_value(&self.form.photo_dir, cx),
        };

        let outcome = self.controller.handle_register(&form);
        if outcome.success {
            // Photo Dir stays filled in as a template for the next user.
            for state in [&self.form.user_id, &self.form.first_name, &self.form.last_name] {
                state.update(cx, |input, cx| input.set_value("", window, cx));
            }
            self.register_status = Some(StatusLine::ok(outcome.message));
        } else {
            self.register_status = Some(StatusLine::error(outcome.message));
        }
    }
}

fn input_value(state: &Entity<InputState>, cx: &App) -> String {
    state.read(cx).value().to_string()
}

fn form_row(label: &'static str, state: &Entity<InputState>) -> AnyElement {
    h_flex()
        .gap_2()
        .items_center()
        .child(
            div()
                .w(gpui::px(88.0))
                .text_sm()
                .text_color(gpui::rgb(0x1a2332))
                .child(label),
        )
        .child(div().flex_1().child(Input::new(state)))
        .into_any_element()
}
