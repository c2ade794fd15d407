//! Custom widgets drawn in the theme's ink and paper

use egui::{Color32, Response, Stroke, Ui, Widget};

fn ink_and_paper(ui: &Ui) -> (Color32, Color32) {
    let visuals = ui.visuals();
    (visuals.widgets.noninteractive.fg_stroke.color, visuals.panel_fill)
}

/// A toggle-style button: paper with a 1px ink outline, inverted while
/// pressed or selected.
pub struct SlowButton<'a> {
    text: &'a str,
    selected: bool,
}

impl<'a> SlowButton<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, selected: false }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl<'a> Widget for SlowButton<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (ink, paper) = ink_and_paper(ui);
        let font = egui::TextStyle::Button.resolve(ui.style());
        let text_width = ui.painter().layout_no_wrap(self.text.to_owned(), font.clone(), ink).size().x;
        let padding = ui.spacing().button_padding.x;
        let size = egui::vec2(text_width + 2.0 * padding, ui.spacing().interact_size.y);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let inverted = self.selected || response.is_pointer_button_down_on();
            let (bg, fg) = if inverted { (ink, paper) } else { (paper, ink) };
            let painter = ui.painter();
            painter.rect_filled(rect, 0.0, bg);
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ink));
            if response.hovered() && !inverted {
                painter.rect_stroke(rect.shrink(2.0), 0.0, Stroke::new(1.0, ink));
            }
            painter.text(rect.center(), egui::Align2::CENTER_CENTER, self.text, font, fg);
        }
        response
    }
}

/// Vertical 1px rule between toolbar groups.
pub fn toolbar_separator(ui: &mut Ui) {
    let (ink, _) = ink_and_paper(ui);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, ui.spacing().interact_size.y), egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        ui.painter().vline(rect.center().x, rect.y_range(), Stroke::new(1.0, ink));
    }
}

/// One line of status text in an outlined frame.
pub fn status_bar(ui: &mut Ui, text: &str) -> Response {
    let (ink, paper) = ink_and_paper(ui);
    egui::Frame::none()
        .fill(paper)
        .stroke(Stroke::new(1.0, ink))
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| ui.label(text))
        .inner
}
