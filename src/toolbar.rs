use egui::{vec2, Align, ComboBox, Layout, Pos2, Rect, RichText, Shape, Stroke, Ui};

use crate::analysis::Modality;
use crate::annotation::DrawTool;
use crate::session::EditorState;
use crate::theme::{AppTheme, WidthClass};
use crate::ui_controls;

#[derive(Clone, Copy, Debug)]
pub struct ToolbarPlan {
    pub show_modality_label: bool,
    pub show_zoom_inline: bool,
    pub show_reset_view: bool,
}

pub fn plan_toolbar_items(width_class: WidthClass, state: &EditorState) -> ToolbarPlan {
    let has_image = state.displayed.is_some();
    ToolbarPlan {
        show_modality_label: width_class != WidthClass::Compact,
        show_zoom_inline: has_image && width_class != WidthClass::Compact,
        show_reset_view: has_image && !state.viewport.is_identity(),
    }
}

#[derive(Default)]
pub struct ToolbarOutput {
    pub modality_changed: bool,
}

pub fn show_toolbar(
    ui: &mut Ui,
    theme: &AppTheme,
    state: &mut EditorState,
    width_class: WidthClass,
) -> ToolbarOutput {
    let mut out = ToolbarOutput::default();
    let plan = plan_toolbar_items(width_class, state);

    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
        ui.spacing_mut().interact_size.y = theme.layout.chip_h;
        ui.spacing_mut().button_padding.y = theme.layout.space_1;
        ui.spacing_mut().item_spacing = vec2(theme.layout.control_gap, 0.0);

        if plan.show_modality_label {
            ui.label(
                RichText::new("Modality")
                    .color(theme.text.muted)
                    .size(12.0),
            );
        }
        out.modality_changed = modality_selector(ui, state);

        group_separator(ui, theme);

        let has_image = state.displayed.is_some();
        ui.add_enabled_ui(has_image, |ui| {
            tool_button(ui, theme, state, DrawTool::Box, "Draw box (B)");
            tool_button(ui, theme, state, DrawTool::Arrow, "Draw arrow (A)");

            let undo = ui_controls::tool_chip(ui, theme, "", false)
                .on_hover_text("Remove annotations, restore original");
            draw_eraser_icon(ui, theme, undo.rect, state.has_annotations);
            if undo.clicked() && state.has_annotations {
                state.undo_annotations();
            }
        });

        if plan.show_zoom_inline {
            group_separator(ui, theme);
            let zoom_allowed = state.active_tool.is_none();
            ui.add_enabled_ui(zoom_allowed, |ui| {
                if ui_controls::tool_chip(ui, theme, "−", false)
                    .on_hover_text("Zoom out")
                    .clicked()
                {
                    state.zoom_out();
                }
                if ui_controls::tool_chip(ui, theme, "+", false)
                    .on_hover_text("Zoom in")
                    .clicked()
                {
                    state.zoom_in();
                }
            });
            if plan.show_reset_view
                && ui_controls::tool_chip(ui, theme, "⟲", false)
                    .on_hover_text("Reset view")
                    .clicked()
            {
                state.reset_view();
            }
            if state.viewport.scale > 1.0 {
                ui.label(
                    RichText::new(format!("{:.1}×", state.viewport.scale))
                        .color(theme.text.muted)
                        .size(12.0),
                );
            }
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if state.active_tool.is_some() {
                ui_controls::subtle_badge(ui, theme, "drag on the image to mark the finding");
            }
        });
    });

    out
}

fn modality_selector(ui: &mut Ui, state: &mut EditorState) -> bool {
    let before = state.modality;
    ComboBox::from_id_source("medimark_modality")
        .selected_text(state.modality.label())
        .width(150.0)
        .show_ui(ui, |ui| {
            for modality in Modality::ALL {
                ui.selectable_value(&mut state.modality, modality, modality.label());
            }
        });
    state.modality != before
}

fn tool_button(ui: &mut Ui, theme: &AppTheme, state: &mut EditorState, tool: DrawTool, hint: &str) {
    let selected = state.active_tool == Some(tool);
    let response = ui_controls::tool_chip(ui, theme, "", selected).on_hover_text(hint);
    draw_tool_icon(ui, theme, response.rect, tool, selected);
    if response.clicked() {
        state.toggle_tool(tool);
    }
}

fn draw_tool_icon(ui: &Ui, theme: &AppTheme, rect: Rect, tool: DrawTool, selected: bool) {
    let color = if selected {
        theme.text.primary
    } else {
        theme.text.secondary
    };
    let stroke = Stroke::new(1.65, color);
    let painter = ui.painter();
    let icon_rect = rect.shrink2(vec2(8.0, 5.0));

    match tool {
        DrawTool::Box => {
            let r = icon_rect.shrink2(vec2(2.0, 3.0));
            painter.rect_stroke(r, 2.5, stroke);
        }
        DrawTool::Arrow => {
            let y = icon_rect.center().y + 0.5;
            let start = Pos2::new(icon_rect.left() + 2.0, y);
            let tip = Pos2::new(icon_rect.right() - 2.0, y);
            painter.line_segment([start, tip], stroke);
            painter.add(Shape::convex_polygon(
                vec![
                    tip,
                    Pos2::new(tip.x - 6.0, tip.y - 4.5),
                    Pos2::new(tip.x - 6.0, tip.y + 4.5),
                ],
                color,
                Stroke::NONE,
            ));
        }
    }
}

fn draw_eraser_icon(ui: &Ui, theme: &AppTheme, rect: Rect, enabled: bool) {
    let color = if enabled {
        theme.text.secondary
    } else {
        theme.text.muted
    };
    let stroke = Stroke::new(1.65, color);
    let painter = ui.painter();
    let icon_rect = rect.shrink2(vec2(9.0, 6.0));

    // A tilted rounded block with a baseline, Tabler-eraser style.
    let body = Rect::from_min_max(
        Pos2::new(icon_rect.left() + 2.0, icon_rect.top()),
        Pos2::new(icon_rect.right(), icon_rect.bottom() - 3.0),
    );
    painter.rect_stroke(body, 2.0, stroke);
    painter.line_segment(
        [
            Pos2::new(icon_rect.left(), icon_rect.bottom()),
            Pos2::new(icon_rect.right(), icon_rect.bottom()),
        ],
        stroke,
    );
}

fn group_separator(ui: &mut Ui, theme: &AppTheme) {
    ui.separator();
    let extra = (theme.layout.group_gap - theme.layout.control_gap).max(0.0);
    if extra > 0.0 {
        ui.add_space(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::plan_toolbar_items;
    use crate::analysis::Modality;
    use crate::session::EditorState;
    use crate::theme::WidthClass;

    #[test]
    fn compact_width_hides_the_zoom_group() {
        let state = EditorState::new(Modality::Ecg);
        let plan = plan_toolbar_items(WidthClass::Compact, &state);
        assert!(!plan.show_modality_label);
        assert!(!plan.show_zoom_inline);
    }

    #[test]
    fn reset_view_appears_only_when_transformed() {
        let mut state = EditorState::new(Modality::Ecg);
        let plan = plan_toolbar_items(WidthClass::Wide, &state);
        // No image yet, nothing to zoom.
        assert!(!plan.show_zoom_inline);
        assert!(!plan.show_reset_view);

        state.viewport.set_scale(2.0);
        let plan = plan_toolbar_items(WidthClass::Wide, &state);
        assert!(!plan.show_reset_view, "needs an image, not just a transform");
    }
}
