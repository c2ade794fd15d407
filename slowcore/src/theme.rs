//! Slow Computer theme: e-ink optimized
//!
//! Two colors, ink on paper, with 1px outlines. Widgets read the ink back
//! from the applied style, so anything drawn by hand matches the theme.

use egui::{Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

/// The default ink and paper.
pub struct SlowColors;

impl SlowColors {
    pub const WHITE: Color32 = Color32::from_rgb(255, 255, 255);
    pub const BLACK: Color32 = Color32::from_rgb(0, 0, 0);
}

/// Theme configuration for slow computer apps
pub struct SlowTheme {
    pub ink: Color32,
    pub paper: Color32,
    pub font_size: f32,
    pub padding: f32,
}

impl Default for SlowTheme {
    fn default() -> Self {
        Self {
            ink: SlowColors::BLACK,
            paper: SlowColors::WHITE,
            font_size: 14.0,
            padding: 8.0,
        }
    }
}

impl SlowTheme {
    /// Ink color of the theme applied to `ctx`; hand-drawn widgets use it
    /// as their foreground.
    pub fn ink(ctx: &Context) -> Color32 {
        ctx.style().visuals.widgets.noninteractive.fg_stroke.color
    }

    /// Paper color of the theme applied to `ctx`.
    pub fn paper(ctx: &Context) -> Color32 {
        ctx.style().visuals.panel_fill
    }

    fn text_styles(&self) -> std::collections::BTreeMap<TextStyle, FontId> {
        let small = (self.font_size * 0.8).round();
        let heading = (self.font_size * 1.6).round();
        [
            (TextStyle::Small, FontId::new(small, FontFamily::Proportional)),
            (TextStyle::Body, FontId::new(self.font_size, FontFamily::Proportional)),
            (TextStyle::Button, FontId::new(self.font_size, FontFamily::Proportional)),
            (TextStyle::Heading, FontId::new(heading, FontFamily::Proportional)),
            (TextStyle::Monospace, FontId::new(self.font_size, FontFamily::Monospace)),
        ]
        .into()
    }

    fn visuals(&self) -> Visuals {
        let mut visuals = Visuals::light();
        visuals.window_fill = self.paper;
        visuals.panel_fill = self.paper;
        visuals.faint_bg_color = self.paper;
        visuals.extreme_bg_color = self.paper;
        visuals.window_rounding = Rounding::ZERO;
        visuals.menu_rounding = Rounding::ZERO;
        visuals.window_stroke = Stroke::new(1.0, self.ink);
        visuals.window_shadow = egui::epaint::Shadow::NONE;
        visuals.popup_shadow = egui::epaint::Shadow::NONE;
        visuals.override_text_color = Some(self.ink);

        for ws in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
            &mut visuals.widgets.open,
        ] {
            ws.bg_fill = self.paper;
            ws.weak_bg_fill = self.paper;
            ws.bg_stroke = Stroke::new(1.0, self.ink);
            ws.fg_stroke = Stroke::new(1.0, self.ink);
            ws.rounding = Rounding::ZERO;
        }

        // selection is the one place a mid tone is allowed
        visuals.selection.bg_fill = Color32::from_rgb(160, 160, 160);
        visuals.selection.stroke = Stroke::new(1.0, self.ink);
        visuals
    }

    /// Apply the slow computer theme to an egui context
    pub fn apply(&self, ctx: &Context) {
        let mut style = Style::default();
        style.text_styles = self.text_styles();
        style.visuals = self.visuals();
        style.spacing.window_margin = egui::Margin::same(self.padding);
        style.spacing.item_spacing = egui::vec2(self.padding / 2.0, self.padding / 2.0);
        style.spacing.button_padding = egui::vec2(self.padding, self.padding / 2.0);
        ctx.set_style(style);
    }
}

/// Menu bar: a 1px outlined strip holding a horizontal layout.
pub fn menu_bar<R>(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui) -> R) -> egui::InnerResponse<R> {
    let ink = ui.visuals().widgets.noninteractive.fg_stroke.color;
    let frame = egui::Frame::none()
        .fill(ui.visuals().panel_fill)
        .stroke(Stroke::new(1.0, ink))
        .inner_margin(egui::Margin::symmetric(4.0, 2.0))
        .show(ui, |ui| ui.horizontal(add_contents).inner);
    egui::InnerResponse {
        inner: frame.inner,
        response: frame.response,
    }
}

/// Strip Cmd+/Cmd- so panel widgets never get zoom-scaled.
/// Call this at the start of `update()`.
pub fn consume_zoom_keys(ctx: &Context) {
    ctx.input_mut(|i| {
        i.events.retain(|event| {
            !matches!(event,
                egui::Event::Key { key, modifiers, .. }
                    if modifiers.command && matches!(key, egui::Key::Plus | egui::Key::Minus | egui::Key::Equals))
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ink_and_paper_follow_applied_theme() {
        let ctx = Context::default();
        SlowTheme::default().apply(&ctx);
        assert_eq!(SlowTheme::ink(&ctx), SlowColors::BLACK);
        assert_eq!(SlowTheme::paper(&ctx), SlowColors::WHITE);

        let inverted = SlowTheme {
            ink: SlowColors::WHITE,
            paper: SlowColors::BLACK,
            ..SlowTheme::default()
        };
        inverted.apply(&ctx);
        assert_eq!(SlowTheme::ink(&ctx), SlowColors::WHITE);
        assert_eq!(SlowTheme::paper(&ctx), SlowColors::BLACK);
    }

    #[test]
    fn test_font_sizes_scale_from_body() {
        let theme = SlowTheme {
            font_size: 20.0,
            ..SlowTheme::default()
        };
        let styles = theme.text_styles();
        assert_eq!(styles[&TextStyle::Body].size, 20.0);
        assert_eq!(styles[&TextStyle::Small].size, 16.0);
        assert_eq!(styles[&TextStyle::Heading].size, 32.0);
    }
}
