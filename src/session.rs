//! Editor session: the uploaded image, its displayed rendition, and the
//! gesture state machine that routes pointer input to panning or drawing.

use anyhow::{Context, Result};
use egui::{ColorImage, Context as EguiContext, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use image::{DynamicImage, ImageFormat};
use log::warn;

use crate::analysis::{AnalysisReport, Modality};
use crate::annotation::{DrawTool, Point, Shape, MIN_DRAG_DISTANCE};
use crate::compose;
use crate::mapping;
use crate::viewport::Viewport;

/// The pristine upload. Created on upload, replaced only by a new upload,
/// never mutated in place — undo always restores these exact bytes.
pub struct ImageSource {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub filename: String,
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Result<Self> {
        let format = image::guess_format(&bytes).context("unrecognised image data")?;
        Ok(Self {
            bytes,
            format,
            filename: filename.into(),
        })
    }
}

/// What the user currently sees: the pristine bitmap, or the latest
/// annotated rendition. `bytes` is the encoded payload handed to the
/// analysis boundary and to save/copy actions.
pub struct DisplayedImage {
    pub bitmap: DynamicImage,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    texture: Option<TextureHandle>,
}

impl DisplayedImage {
    fn new(bitmap: DynamicImage, bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            bitmap,
            bytes,
            format,
            texture: None,
        }
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.bitmap.width(), self.bitmap.height())
    }

    pub fn size_vec2(&self) -> Vec2 {
        Vec2::new(self.bitmap.width() as f32, self.bitmap.height() as f32)
    }

    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn texture_id(&mut self, ctx: &EguiContext) -> egui::TextureId {
        if self.texture.is_none() {
            let rgba = self.bitmap.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            self.texture = Some(ctx.load_texture("clinical-image", color, TextureOptions::LINEAR));
        }
        self.texture.as_ref().expect("texture was just created").id()
    }
}

/// A pointer position captured in both spaces the engine needs: natural
/// pixels for the compositor, percent-of-rendered-rect for the preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GesturePoint {
    pub natural: Point,
    pub percent: Point,
}

fn capture(pointer: Pos2, image_rect: Rect, natural: (u32, u32)) -> GesturePoint {
    GesturePoint {
        natural: mapping::to_natural(pointer, image_rect, natural.0, natural.1),
        percent: mapping::to_percent(pointer, image_rect),
    }
}

/// The active pointer gesture. A single tagged state: panning while drawing
/// (or vice versa) is unrepresentable.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        anchor: Vec2,
    },
    Drawing {
        tool: DrawTool,
        start: GesturePoint,
        current: GesturePoint,
    },
}

pub struct EditorState {
    pub source: Option<ImageSource>,
    pub displayed: Option<DisplayedImage>,
    pub has_annotations: bool,
    pub active_tool: Option<DrawTool>,
    pub gesture: Gesture,
    pub viewport: Viewport,
    pub modality: Modality,
    pub report: Option<AnalysisReport>,
    pub analysis_running: bool,
    /// Surfaced errors and notices, shown in the action bar.
    pub status: Option<String>,
}

impl EditorState {
    pub fn new(modality: Modality) -> Self {
        Self {
            source: None,
            displayed: None,
            has_annotations: false,
            active_tool: None,
            gesture: Gesture::Idle,
            viewport: Viewport::identity(),
            modality,
            report: None,
            analysis_running: false,
            status: None,
        }
    }

    /// Replace the session with a fresh upload. All annotation, viewport and
    /// report state belongs to the image and is discarded with it.
    pub fn load_source(&mut self, source: ImageSource) -> Result<()> {
        let bitmap = image::load_from_memory(&source.bytes)
            .with_context(|| format!("cannot decode '{}'", source.filename))?;
        self.displayed = Some(DisplayedImage::new(bitmap, source.bytes.clone(), source.format));
        self.source = Some(source);
        self.has_annotations = false;
        self.active_tool = None;
        self.gesture = Gesture::Idle;
        self.viewport.reset();
        self.report = None;
        self.status = None;
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.source = None;
        self.displayed = None;
        self.has_annotations = false;
        self.active_tool = None;
        self.gesture = Gesture::Idle;
        self.viewport.reset();
        self.report = None;
        self.status = None;
    }

    /// Select a drawing tool; selecting the active one deselects it.
    /// Entering drawing mode resets the viewport so the mapping the user
    /// sees is 1:1 while annotating.
    pub fn toggle_tool(&mut self, tool: DrawTool) {
        if self.displayed.is_none() {
            return;
        }
        if self.active_tool == Some(tool) {
            self.active_tool = None;
        } else {
            self.active_tool = Some(tool);
            self.viewport.reset();
        }
        self.gesture = Gesture::Idle;
    }

    // Zoom is suppressed while a tool is active: scroll-to-zoom and draw
    // gestures must not compete for the pointer.

    pub fn wheel_zoom(&mut self, delta_y: f32) {
        if self.active_tool.is_some() {
            return;
        }
        self.viewport.wheel_zoom(delta_y);
    }

    pub fn zoom_in(&mut self) {
        if self.active_tool.is_some() {
            return;
        }
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        if self.active_tool.is_some() {
            return;
        }
        self.viewport.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn pointer_down(&mut self, pointer: Pos2, image_rect: Rect) {
        let Some(displayed) = self.displayed.as_ref() else {
            return;
        };

        if let Some(tool) = self.active_tool {
            let point = capture(pointer, image_rect, displayed.natural_size());
            self.gesture = Gesture::Drawing {
                tool,
                start: point,
                current: point,
            };
        } else if self.viewport.scale > 1.0 {
            self.gesture = Gesture::Panning {
                anchor: self.viewport.pan_anchor(pointer),
            };
        }
    }

    pub fn pointer_move(&mut self, pointer: Pos2, image_rect: Rect) {
        let natural = match self.displayed.as_ref() {
            Some(displayed) => displayed.natural_size(),
            None => return,
        };
        match &mut self.gesture {
            Gesture::Drawing { current, .. } => {
                *current = capture(pointer, image_rect, natural);
            }
            Gesture::Panning { anchor } => {
                let anchor = *anchor;
                self.viewport.update_pan(pointer, anchor);
            }
            Gesture::Idle => {}
        }
    }

    /// Pointer-up and pointer-leave both land here: a draw gesture is
    /// finalised (or discarded as an accidental click), a pan just ends.
    pub fn end_gesture(&mut self) {
        let gesture = std::mem::take(&mut self.gesture);
        if let Gesture::Drawing { tool, start, current } = gesture {
            self.finish_draw(tool, start, current);
        }
    }

    fn finish_draw(&mut self, tool: DrawTool, start: GesturePoint, current: GesturePoint) {
        if start.natural.distance_to(current.natural) < MIN_DRAG_DISTANCE {
            // Accidental click, not an annotation.
            return;
        }
        let Some(displayed) = self.displayed.as_ref() else {
            return;
        };

        let shape = Shape::from_gesture(tool, start.natural, current.natural);
        let format = match displayed.format {
            ImageFormat::Jpeg => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        };

        let burned = compose::burn(&displayed.bitmap, &shape)
            .and_then(|bitmap| compose::encode(&bitmap, format).map(|bytes| (bitmap, bytes)));

        match burned {
            Ok((bitmap, bytes)) => {
                self.displayed = Some(DisplayedImage::new(bitmap, bytes, format));
                self.has_annotations = true;
                self.report = None;
                self.status = None;
            }
            Err(err) => {
                warn!("annotation failed: {err:#}");
                self.status = Some(format!("Annotation failed: {err:#}"));
            }
        }
    }

    /// Restore the pristine upload, bit for bit.
    pub fn undo_annotations(&mut self) {
        if !self.has_annotations {
            return;
        }
        let Some(source) = self.source.as_ref() else {
            return;
        };

        match image::load_from_memory(&source.bytes) {
            Ok(bitmap) => {
                self.displayed = Some(DisplayedImage::new(
                    bitmap,
                    source.bytes.clone(),
                    source.format,
                ));
                self.has_annotations = false;
                self.active_tool = None;
                self.gesture = Gesture::Idle;
                self.report = None;
                self.status = None;
            }
            Err(err) => {
                warn!("cannot restore original image: {err:#}");
                self.status = Some(format!("Cannot restore original image: {err:#}"));
            }
        }
    }

    pub fn can_analyze(&self) -> bool {
        self.displayed.is_some() && !self.analysis_running
    }
}

#[cfg(test)]
mod tests {
    use egui::{vec2, Pos2, Rect, Vec2};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    use super::{EditorState, Gesture, ImageSource};
    use crate::analysis::Modality;
    use crate::annotation::DrawTool;
    use crate::compose;

    fn jpeg_source(width: u32, height: u32) -> ImageSource {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ));
        let bytes = compose::encode(&image, ImageFormat::Jpeg).expect("encode fixture");
        ImageSource::from_bytes(bytes, "scan.jpg").expect("fixture source")
    }

    fn state_with_image(width: u32, height: u32) -> (EditorState, Rect) {
        let mut state = EditorState::new(Modality::Ecg);
        state.load_source(jpeg_source(width, height)).expect("load");
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(width as f32, height as f32));
        (state, rect)
    }

    #[test]
    fn upload_resets_the_session() {
        let (mut state, _) = state_with_image(300, 200);
        state.viewport.set_scale(4.0);
        state.has_annotations = true;

        state.load_source(jpeg_source(120, 80)).expect("reload");
        assert!(state.viewport.is_identity());
        assert!(!state.has_annotations);
        assert_eq!(state.active_tool, None);
        let displayed = state.displayed.as_ref().unwrap();
        assert_eq!(displayed.natural_size(), (120, 80));
        assert_eq!(displayed.bytes, state.source.as_ref().unwrap().bytes);
    }

    #[test]
    fn toggling_the_same_tool_deselects_it() {
        let (mut state, _) = state_with_image(200, 200);
        state.toggle_tool(DrawTool::Arrow);
        assert_eq!(state.active_tool, Some(DrawTool::Arrow));
        state.toggle_tool(DrawTool::Arrow);
        assert_eq!(state.active_tool, None);
    }

    #[test]
    fn selecting_a_tool_resets_the_viewport() {
        let (mut state, _) = state_with_image(200, 200);
        state.viewport.set_scale(4.0);
        state.viewport.pan = Vec2::new(12.0, -3.0);

        state.toggle_tool(DrawTool::Box);
        assert!(state.viewport.is_identity());
    }

    #[test]
    fn zoom_is_inert_while_a_tool_is_active() {
        let (mut state, _) = state_with_image(200, 200);
        state.toggle_tool(DrawTool::Box);

        state.wheel_zoom(-200.0);
        state.zoom_in();
        assert_eq!(state.viewport.scale, 1.0);

        state.toggle_tool(DrawTool::Box);
        state.zoom_in();
        assert_eq!(state.viewport.scale, 1.5);
    }

    #[test]
    fn degenerate_drag_changes_nothing() {
        let (mut state, rect) = state_with_image(300, 200);
        let before = state.displayed.as_ref().unwrap().bytes.clone();

        state.toggle_tool(DrawTool::Box);
        state.pointer_down(Pos2::new(50.0, 50.0), rect);
        state.pointer_move(Pos2::new(52.0, 51.0), rect);
        state.end_gesture();

        assert!(!state.has_annotations);
        assert_eq!(state.displayed.as_ref().unwrap().bytes, before);
        assert_eq!(state.gesture, Gesture::Idle);
    }

    #[test]
    fn box_draw_burns_and_undo_restores_the_original() {
        let (mut state, rect) = state_with_image(300, 200);
        let original = state.source.as_ref().unwrap().bytes.clone();

        state.toggle_tool(DrawTool::Box);
        state.pointer_down(Pos2::new(50.0, 50.0), rect);
        state.pointer_move(Pos2::new(150.0, 120.0), rect);
        state.end_gesture();

        assert!(state.has_annotations);
        let annotated = state.displayed.as_ref().unwrap();
        assert_ne!(annotated.bytes, original);
        assert_eq!(annotated.format, ImageFormat::Jpeg);
        // The tool stays armed for the next shape.
        assert_eq!(state.active_tool, Some(DrawTool::Box));

        state.undo_annotations();
        assert!(!state.has_annotations);
        assert_eq!(state.active_tool, None);
        assert_eq!(state.displayed.as_ref().unwrap().bytes, original);
    }

    #[test]
    fn shapes_accumulate_on_the_displayed_bitmap() {
        let (mut state, rect) = state_with_image(300, 200);

        state.toggle_tool(DrawTool::Box);
        state.pointer_down(Pos2::new(20.0, 20.0), rect);
        state.pointer_move(Pos2::new(80.0, 80.0), rect);
        state.end_gesture();
        let after_first = state.displayed.as_ref().unwrap().bytes.clone();

        state.pointer_down(Pos2::new(120.0, 40.0), rect);
        state.pointer_move(Pos2::new(220.0, 140.0), rect);
        state.end_gesture();

        assert!(state.has_annotations);
        assert_ne!(state.displayed.as_ref().unwrap().bytes, after_first);
    }

    #[test]
    fn panning_requires_zoom_and_no_tool() {
        let (mut state, rect) = state_with_image(200, 200);

        state.pointer_down(Pos2::new(40.0, 40.0), rect);
        assert_eq!(state.gesture, Gesture::Idle);

        state.viewport.set_scale(2.0);
        state.pointer_down(Pos2::new(40.0, 40.0), rect);
        assert!(matches!(state.gesture, Gesture::Panning { .. }));

        state.pointer_move(Pos2::new(70.0, 25.0), rect);
        assert_eq!(state.viewport.pan, Vec2::new(30.0, -15.0));

        state.end_gesture();
        assert_eq!(state.gesture, Gesture::Idle);
        // The pan itself survives the end of the gesture.
        assert_eq!(state.viewport.pan, Vec2::new(30.0, -15.0));
    }

    #[test]
    fn undo_without_annotations_is_a_noop() {
        let (mut state, _) = state_with_image(200, 200);
        let before = state.displayed.as_ref().unwrap().bytes.clone();
        state.undo_annotations();
        assert_eq!(state.displayed.as_ref().unwrap().bytes, before);
    }
}
