use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::annotation::{self, Point, RectData, Shape, ACCENT_RGBA, BOX_FILL_ALPHA};

/// Burn one shape into a copy of `image` and return the new bitmap.
///
/// Coordinates are in natural pixel space, so the result is independent of
/// the on-screen zoom and display size. The input bitmap is whatever is
/// currently displayed, which is how consecutive annotations accumulate.
pub fn burn(image: &DynamicImage, shape: &Shape) -> Result<DynamicImage> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| anyhow!("cannot allocate pixmap"))?;

    copy_image_to_pixmap(image, &mut pixmap)?;

    let stroke_width = annotation::stroke_width_for(image.width(), image.height());
    match shape {
        Shape::Arrow { from, to } => draw_arrow(&mut pixmap, *from, *to, stroke_width)?,
        Shape::Box { rect } => draw_box(&mut pixmap, *rect, stroke_width)?,
    }

    let output = RgbaImage::from_raw(image.width(), image.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("cannot construct output image"))?;

    Ok(DynamicImage::ImageRgba8(output))
}

/// Re-encode a bitmap to the source media type: JPEG at quality 95, PNG for
/// everything else.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let rgb = image.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 95);
            encoder.encode_image(&rgb).context("cannot encode JPEG")?;
        }
        _ => {
            image
                .write_to(&mut buffer, ImageFormat::Png)
                .context("cannot encode PNG")?;
        }
    }
    Ok(buffer.into_inner())
}

fn copy_image_to_pixmap(image: &DynamicImage, pixmap: &mut Pixmap) -> Result<()> {
    let rgba = image.to_rgba8();
    let data = pixmap.data_mut();
    if data.len() != rgba.len() {
        return Err(anyhow!("source image and pixmap size mismatch"));
    }
    data.copy_from_slice(rgba.as_raw());
    Ok(())
}

fn accent_paint() -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(ACCENT_RGBA[0], ACCENT_RGBA[1], ACCENT_RGBA[2], ACCENT_RGBA[3]);
    paint.anti_alias = true;
    paint
}

fn shape_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn draw_box(pixmap: &mut Pixmap, rect: RectData, stroke_width: f32) -> Result<()> {
    let rect = rect.normalize();
    let tiny_rect = Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y)
        .ok_or_else(|| anyhow!("invalid box rectangle"))?;
    let path = PathBuilder::from_rect(tiny_rect);

    let mut fill = accent_paint();
    fill.set_color_rgba8(ACCENT_RGBA[0], ACCENT_RGBA[1], ACCENT_RGBA[2], BOX_FILL_ALPHA);
    pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);

    pixmap.stroke_path(
        &path,
        &accent_paint(),
        &shape_stroke(stroke_width),
        Transform::identity(),
        None,
    );
    Ok(())
}

fn draw_arrow(pixmap: &mut Pixmap, from: Point, to: Point, stroke_width: f32) -> Result<()> {
    let paint = accent_paint();

    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    let shaft = pb.finish().ok_or_else(|| anyhow!("cannot build arrow shaft"))?;
    pixmap.stroke_path(
        &shaft,
        &paint,
        &shape_stroke(stroke_width),
        Transform::identity(),
        None,
    );

    // Head legs at ±30° from the shaft direction, length proportional to
    // the stroke so heads stay legible at any resolution.
    let head_len = stroke_width * 5.0;
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let left = Point::new(
        to.x - head_len * (angle - std::f32::consts::FRAC_PI_6).cos(),
        to.y - head_len * (angle - std::f32::consts::FRAC_PI_6).sin(),
    );
    let right = Point::new(
        to.x - head_len * (angle + std::f32::consts::FRAC_PI_6).cos(),
        to.y - head_len * (angle + std::f32::consts::FRAC_PI_6).sin(),
    );

    let mut pb = PathBuilder::new();
    pb.move_to(to.x, to.y);
    pb.line_to(left.x, left.y);
    pb.line_to(right.x, right.y);
    pb.close();
    let head = pb.finish().ok_or_else(|| anyhow!("cannot build arrow head"))?;
    pixmap.fill_path(&head, &paint, FillRule::Winding, Transform::identity(), None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};

    use super::{burn, encode};
    use crate::annotation::{DrawTool, Point, Shape};

    fn white_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    #[test]
    fn burn_keeps_image_size() {
        let image = white_image(320, 200);
        let shape = Shape::from_gesture(
            DrawTool::Box,
            Point::new(10.0, 10.0),
            Point::new(110.0, 60.0),
        );

        let result = burn(&image, &shape).expect("burn should succeed");
        assert_eq!(result.width(), 320);
        assert_eq!(result.height(), 200);
    }

    #[test]
    fn box_stroke_changes_pixels_on_its_outline() {
        let image = white_image(200, 200);
        let shape = Shape::from_gesture(
            DrawTool::Box,
            Point::new(20.0, 20.0),
            Point::new(120.0, 120.0),
        );

        let result = burn(&image, &shape).expect("burn should succeed");
        // On the stroke the accent dominates; well outside it nothing moved.
        assert_ne!(result.get_pixel(20, 70), Rgba([255, 255, 255, 255]));
        assert_eq!(result.get_pixel(180, 180), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn arrow_marks_the_shaft_midpoint() {
        let image = white_image(200, 200);
        let shape = Shape::from_gesture(
            DrawTool::Arrow,
            Point::new(40.0, 100.0),
            Point::new(160.0, 100.0),
        );

        let result = burn(&image, &shape).expect("burn should succeed");
        assert_ne!(result.get_pixel(100, 100), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn encode_round_trips_dimensions() {
        let image = white_image(300, 200);

        let jpeg = encode(&image, ImageFormat::Jpeg).expect("jpeg encode");
        let decoded = image::load_from_memory(&jpeg).expect("jpeg decode");
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);

        let png = encode(&image, ImageFormat::Png).expect("png encode");
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }
}
