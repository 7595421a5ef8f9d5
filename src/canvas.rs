use egui::{
    vec2, Align2, Color32, Context, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2,
};

use crate::annotation::ACCENT_RGBA;
use crate::mapping;
use crate::session::{EditorState, Gesture};
use crate::theme::AppTheme;
use crate::ui_controls;

/// Margin between the canvas edge and the fitted image.
const CANVAS_MARGIN: f32 = 24.0;

#[derive(Default)]
pub struct CanvasOutput {
    pub upload_clicked: bool,
}

pub fn show_canvas(
    ui: &mut Ui,
    ctx: &Context,
    theme: &AppTheme,
    state: &mut EditorState,
) -> CanvasOutput {
    let mut out = CanvasOutput::default();

    let Some(image_size) = state.displayed.as_ref().map(|d| d.size_vec2()) else {
        out.upload_clicked = empty_canvas(ui, ctx, theme);
        return out;
    };

    let (canvas_rect, response) =
        ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    let painter = ui.painter_at(canvas_rect);
    painter.rect_filled(canvas_rect, 16.0, theme.surfaces.canvas_bg);
    painter.rect_stroke(canvas_rect, 16.0, Stroke::new(1.0, theme.surfaces.stroke_soft));

    // Object-contain fit first, then the viewport transform about the
    // container centre (scale, then the scale-multiplied pan).
    let fitted = fit_size(
        image_size,
        canvas_rect.size() - vec2(CANVAS_MARGIN * 2.0, CANVAS_MARGIN * 2.0),
    );
    let center = canvas_rect.center() + state.viewport.screen_offset();
    let image_rect = Rect::from_center_size(center, fitted * state.viewport.scale);

    let texture_id = state
        .displayed
        .as_mut()
        .expect("displayed image checked above")
        .texture_id(ctx);
    painter.image(
        texture_id,
        image_rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    draw_preview(&painter, state, image_rect);
    handle_pointer(ctx, state, &response, image_rect);

    out
}

/// Scale `image` to fit inside `available` while preserving aspect ratio.
pub fn fit_size(image: Vec2, available: Vec2) -> Vec2 {
    let scale = (available.x.max(1.0) / image.x.max(1.0))
        .min(available.y.max(1.0) / image.y.max(1.0));
    image * scale
}

fn accent(alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(ACCENT_RGBA[0], ACCENT_RGBA[1], ACCENT_RGBA[2], alpha)
}

/// The live preview is a vector overlay in percent coordinates, so it
/// tracks the image through any container resize; the burned-in result is
/// rendered from natural pixels on pointer-up.
fn draw_preview(painter: &egui::Painter, state: &EditorState, image_rect: Rect) {
    let Gesture::Drawing { tool, start, current } = state.gesture else {
        return;
    };

    let start_screen = mapping::percent_to_screen(start.percent, image_rect);
    let current_screen = mapping::percent_to_screen(current.percent, image_rect);
    let stroke = Stroke::new(3.0, accent(255));

    match tool {
        crate::annotation::DrawTool::Box => {
            let rect = Rect::from_two_pos(start_screen, current_screen);
            painter.rect_filled(rect, 0.0, accent(51));
            painter.rect_stroke(rect, 0.0, stroke);
        }
        crate::annotation::DrawTool::Arrow => {
            painter.line_segment([start_screen, current_screen], stroke);
            painter.circle_filled(current_screen, 5.0, accent(255));
        }
    }
}

fn handle_pointer(ctx: &Context, state: &mut EditorState, response: &egui::Response, image_rect: Rect) {
    // Pointer left the canvas mid-gesture: finalise (or discard) it, same
    // as pointer-up.
    if !response.hovered() && !response.dragged() && state.gesture != Gesture::Idle {
        state.end_gesture();
        return;
    }

    if response.hovered() {
        let scroll = ctx.input(|input| input.raw_scroll_delta.y);
        if scroll != 0.0 {
            // Wheel-up zooms in.
            state.wheel_zoom(-scroll);
        }

        let cursor = if state.active_tool.is_some() {
            CursorIcon::Crosshair
        } else if matches!(state.gesture, Gesture::Panning { .. }) {
            CursorIcon::Grabbing
        } else if state.viewport.scale > 1.0 {
            CursorIcon::Grab
        } else {
            CursorIcon::Default
        };
        ctx.output_mut(|output| output.cursor_icon = cursor);
    }

    let Some(pointer) = ctx.input(|input| input.pointer.interact_pos()) else {
        return;
    };

    if response.drag_started() {
        state.pointer_down(pointer, image_rect);
    }
    if response.dragged() {
        state.pointer_move(pointer, image_rect);
    }
    if response.drag_stopped() {
        state.end_gesture();
    }
}

fn empty_canvas(ui: &mut Ui, ctx: &Context, theme: &AppTheme) -> bool {
    let mut clicked = false;
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    let painter = ui.painter_at(rect);

    let hovering_file = ctx.input(|input| !input.raw.hovered_files.is_empty());
    let border = if hovering_file {
        Stroke::new(2.0, theme.surfaces.accent)
    } else {
        Stroke::new(1.0, theme.surfaces.stroke_soft)
    };
    painter.rect_filled(rect, 16.0, theme.surfaces.canvas_bg);
    painter.rect_stroke(rect, 16.0, border);

    painter.text(
        rect.center() - vec2(0.0, 44.0),
        Align2::CENTER_CENTER,
        "Clinical image input",
        FontId::proportional(19.0),
        theme.text.primary,
    );
    painter.text(
        rect.center() - vec2(0.0, 18.0),
        Align2::CENTER_CENTER,
        "Drop a diagnostic capture here, or browse for a file",
        FontId::proportional(14.0),
        theme.text.secondary,
    );

    let button_size = vec2(150.0, 34.0);
    let button_rect = Rect::from_center_size(rect.center() + vec2(0.0, 28.0), button_size);
    let mut button_ui = ui.child_ui(
        button_rect,
        egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
    );
    if ui_controls::primary_button(&mut button_ui, theme, "Upload File", button_size).clicked() {
        clicked = true;
    }

    clicked
}

#[cfg(test)]
mod tests {
    use super::fit_size;
    use egui::vec2;

    #[test]
    fn fit_preserves_aspect_ratio() {
        let fitted = fit_size(vec2(400.0, 200.0), vec2(100.0, 100.0));
        assert_eq!(fitted, vec2(100.0, 50.0));

        let tall = fit_size(vec2(100.0, 400.0), vec2(300.0, 100.0));
        assert_eq!(tall, vec2(25.0, 100.0));
    }

    #[test]
    fn fit_upscales_small_images() {
        let fitted = fit_size(vec2(50.0, 50.0), vec2(200.0, 100.0));
        assert_eq!(fitted, vec2(100.0, 100.0));
    }
}
