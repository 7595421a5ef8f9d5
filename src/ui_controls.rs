use egui::{vec2, Color32, Frame, Margin, Rect, RichText, Rounding, Sense, Stroke, Ui, Vec2};

use crate::theme::AppTheme;

pub fn card_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.surfaces.card_bg)
        .rounding(Rounding::same(theme.controls.card_rounding))
        .stroke(Stroke::new(1.0, theme.surfaces.stroke_soft))
        .inner_margin(Margin::symmetric(
            theme.layout.space_4,
            theme.layout.space_3,
        ))
}

pub fn toolbar_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.surfaces.panel_bg)
        .rounding(Rounding::ZERO)
        .inner_margin(Margin::symmetric(
            theme.layout.panel_padding_x,
            theme.layout.panel_padding_y,
        ))
}

pub fn action_bar_frame(theme: &AppTheme) -> Frame {
    let vertical_padding = ((theme.layout.action_bar_height - theme.controls.action_height) * 0.5)
        .round()
        .max(theme.layout.space_1);

    Frame::none()
        .fill(theme.surfaces.panel_bg)
        .rounding(Rounding::ZERO)
        .inner_margin(Margin::symmetric(
            theme.layout.panel_padding_x,
            vertical_padding,
        ))
}

pub fn tool_chip(ui: &mut Ui, theme: &AppTheme, label: &str, selected: bool) -> egui::Response {
    let mut button = egui::Button::new(RichText::new(label).size(theme.controls.toolbar_icon_size))
        .min_size(vec2(theme.layout.chip_w_tool, theme.layout.chip_h))
        .rounding(Rounding::same(theme.controls.chip_rounding));

    if selected {
        button = button
            .fill(theme.surfaces.accent_soft)
            .stroke(Stroke::new(1.0, theme.shadows.focus_ring));
    } else {
        button = button.fill(theme.surfaces.card_bg);
    }

    ui.add(button)
}

pub fn primary_button(
    ui: &mut Ui,
    theme: &AppTheme,
    label: &str,
    min_size: Vec2,
) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).strong().color(theme.text.primary))
            .min_size(min_size)
            .fill(theme.surfaces.accent_soft)
            .stroke(Stroke::new(1.0, theme.surfaces.accent))
            .rounding(Rounding::same(theme.controls.button_rounding)),
    )
}

pub fn ghost_button(ui: &mut Ui, theme: &AppTheme, label: &str, min_size: Vec2) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(theme.text.secondary))
            .min_size(min_size)
            .fill(theme.surfaces.card_bg)
            .stroke(Stroke::new(1.0, theme.surfaces.stroke_soft))
            .rounding(Rounding::same(theme.controls.button_rounding)),
    )
}

pub fn subtle_badge(ui: &mut Ui, theme: &AppTheme, text: &str) {
    let label = RichText::new(text)
        .size(12.0)
        .color(theme.text.accent)
        .strong();
    Frame::none()
        .fill(Color32::from_rgba_unmultiplied(
            theme.surfaces.accent.r(),
            theme.surfaces.accent.g(),
            theme.surfaces.accent.b(),
            34,
        ))
        .rounding(Rounding::same(10.0))
        .stroke(Stroke::new(1.0, theme.surfaces.accent_soft))
        .inner_margin(Margin::symmetric(8.0, 4.0))
        .show(ui, |ui| {
            ui.label(label);
        });
}

/// Full-width red banner for urgent findings.
pub fn urgent_banner(ui: &mut Ui, theme: &AppTheme, text: &str) {
    Frame::none()
        .fill(theme.status.danger_soft)
        .rounding(Rounding::same(theme.controls.panel_rounding))
        .stroke(Stroke::new(1.0, theme.status.danger))
        .inner_margin(Margin::symmetric(
            theme.layout.space_3,
            theme.layout.space_2,
        ))
        .show(ui, |ui| {
            ui.label(
                RichText::new(text)
                    .strong()
                    .color(theme.status.danger)
                    .size(14.0),
            );
        });
}

/// Horizontal 0–100 meter for the report's confidence score. Low scores
/// render in the warning color so poor image quality is obvious.
pub fn confidence_meter(ui: &mut Ui, theme: &AppTheme, score: f32) {
    let score = score.clamp(0.0, 100.0);
    let fill_color = if score < 50.0 {
        theme.status.warning
    } else if score >= 80.0 {
        theme.status.success
    } else {
        theme.surfaces.accent
    };

    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), 8.0), Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, 4.0, theme.surfaces.canvas_bg);
    let fill = Rect::from_min_size(rect.min, vec2(rect.width() * score / 100.0, rect.height()));
    painter.rect_filled(fill, 4.0, fill_color);
    painter.rect_stroke(rect, 4.0, Stroke::new(1.0, theme.surfaces.stroke_soft));
}

pub fn vertical_divider(ui: &mut Ui, theme: &AppTheme, height: f32) {
    let (rect, _) = ui.allocate_exact_size(vec2(1.0, height), Sense::hover());
    ui.painter().line_segment(
        [rect.center_top(), rect.center_bottom()],
        Stroke::new(1.0, theme.surfaces.stroke_soft),
    );
}

pub fn keycap(ui: &mut Ui, theme: &AppTheme, label: &str) {
    Frame::none()
        .fill(Color32::from_rgba_unmultiplied(255, 255, 255, 18))
        .stroke(Stroke::new(
            1.0,
            Color32::from_rgba_unmultiplied(255, 255, 255, 40),
        ))
        .rounding(Rounding::same(5.0))
        .inner_margin(Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.label(
                RichText::new(label)
                    .size(11.0)
                    .strong()
                    .color(theme.text.secondary),
            );
        });
}
