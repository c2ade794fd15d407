//! Drawing surface: rasterizes a `DrawList` with tiny-skia, and tracker
//! icons with resvg

use crate::color::HexColor;
use crate::gaze::Point;
use crate::render::{DrawList, DrawOp, Paint, PathSeg};
use std::path::Path as FilePath;
use tiny_skia::{FillRule, Mask, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

fn skia_paint(color: HexColor) -> tiny_skia::Paint<'static> {
    let [r, g, b] = color.rgb();
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    paint
}

fn build_path(segments: &[PathSeg]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for seg in segments {
        match *seg {
            PathSeg::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathSeg::CubicTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32, c1.y as f32,
                c2.x as f32, c2.y as f32,
                p.x as f32, p.y as f32,
            ),
            PathSeg::Close => pb.close(),
        }
    }
    pb.finish()
}

fn oval(radii: (f64, f64)) -> Option<Path> {
    let (rx, ry) = (radii.0 as f32, radii.1 as f32);
    let rect = Rect::from_xywh(-rx, -ry, 2.0 * rx, 2.0 * ry)?;
    PathBuilder::from_oval(rect)
}

fn ellipse_transform(base: Transform, center: Point, rotation: f64) -> Transform {
    base.pre_translate(center.x as f32, center.y as f32)
        .pre_concat(Transform::from_rotate(rotation.to_degrees() as f32))
}

fn draw(pixmap: &mut Pixmap, path: &Path, paint: Paint, transform: Transform, mask: Option<&Mask>) {
    match paint {
        Paint::Fill(color) => {
            pixmap.fill_path(path, &skia_paint(color), FillRule::Winding, transform, mask);
        }
        Paint::Stroke { color, width } => {
            let stroke = Stroke {
                width: width as f32,
                ..Stroke::default()
            };
            pixmap.stroke_path(path, &skia_paint(color), &stroke, transform, mask);
        }
    }
}

/// Paint `list` onto `pixmap`, with the list's origin at the pixmap center.
pub fn paint(list: &DrawList, pixmap: &mut Pixmap) {
    let base = Transform::from_translate(pixmap.width() as f32 / 2.0, pixmap.height() as f32 / 2.0)
        .pre_scale(list.scale.0 as f32, list.scale.1 as f32);
    let mut clip: Option<Mask> = None;

    for op in &list.ops {
        match op {
            DrawOp::Ellipse { center, radii, rotation, paint } => {
                if let Some(path) = oval(*radii) {
                    let transform = ellipse_transform(base, *center, *rotation);
                    draw(pixmap, &path, *paint, transform, clip.as_ref());
                }
            }
            DrawOp::Path { segments, paint } => {
                if let Some(path) = build_path(segments) {
                    draw(pixmap, &path, *paint, base, clip.as_ref());
                }
            }
            DrawOp::Clip { segments } => {
                let Some(path) = build_path(segments) else {
                    continue;
                };
                if let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) {
                    mask.fill_path(&path, FillRule::Winding, true, base);
                    clip = Some(mask);
                }
            }
        }
    }
}

/// Rasterize `list` into a fresh transparent pixmap of the list's size.
/// Returns `None` for an empty area.
pub fn rasterize(list: &DrawList) -> Option<Pixmap> {
    let width = list.width.round().max(0.0) as u32;
    let height = list.height.round().max(0.0) as u32;
    let mut pixmap = Pixmap::new(width, height)?;
    paint(list, &mut pixmap);
    Some(pixmap)
}

/// Convert a pixmap into an egui image for upload as a texture.
pub fn to_color_image(pixmap: &Pixmap) -> egui::ColorImage {
    egui::ColorImage::from_rgba_premultiplied(
        [pixmap.width() as usize, pixmap.height() as usize],
        pixmap.data(),
    )
}

/// Render an SVG file into a transparent `size` x `size` image, scaled to
/// fit. Returns `None` if the file cannot be read or parsed.
pub fn render_svg(path: &FilePath, size: u32) -> Option<egui::ColorImage> {
    let text = std::fs::read_to_string(path).ok()?;
    let opt = resvg::usvg::Options::default();
    let fontdb = resvg::usvg::fontdb::Database::new();
    let tree = resvg::usvg::Tree::from_str(&text, &opt, &fontdb).ok()?;

    let svg = tree.size();
    if svg.width() <= 0.0 || svg.height() <= 0.0 {
        return None;
    }
    let scale = (size as f32 / svg.width()).min(size as f32 / svg.height());
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)?;
    resvg::render(&tree, resvg::tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Some(egui::ColorImage::from_rgba_premultiplied(
        [size as usize, size as usize],
        pixmap.data(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::{compute_gaze, EyeGeometry, EyeShape};
    use crate::render::{build_eye, EyeStyle};

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn filled_style() -> EyeStyle {
        EyeStyle {
            foreground: HexColor::WHITE,
            iris: HexColor::from_rgb(0, 0, 255),
            eyelid: HexColor::from_rgb(255, 0, 0),
            line_mode: false,
            line_width: 1.0,
        }
    }

    #[test]
    fn test_round_eye_pixels() {
        let geometry = EyeGeometry::for_area(EyeShape::Round, 46.0, 1.0).unwrap();
        // looking straight at the viewer: pupil centered
        let gaze = compute_gaze(Point::new(0.0, 0.0), Point::new(0.0, 0.0), &geometry);
        let list = build_eye(EyeShape::Round, &gaze, &filled_style(), false, 46.0, 46.0);
        let pixmap = rasterize(&list).unwrap();

        assert_eq!(pixel(&pixmap, 23, 23), [0, 0, 0, 255]);
        // corners are outside the eyeball
        assert_eq!(pixel(&pixmap, 0, 0)[3], 0);
        // eyeball white just inside the rim, left of the iris
        assert_eq!(pixel(&pixmap, 23 - 18, 23), [255, 255, 255, 255]);
    }

    #[test]
    fn test_closed_eye_is_eyelid_colored() {
        let geometry = EyeGeometry::for_area(EyeShape::Round, 46.0, 1.0).unwrap();
        let gaze = compute_gaze(Point::new(0.0, 0.0), Point::new(0.0, 0.0), &geometry);
        let list = build_eye(EyeShape::Round, &gaze, &filled_style(), true, 46.0, 46.0);
        let pixmap = rasterize(&list).unwrap();

        assert_eq!(pixel(&pixmap, 23, 16), [255, 0, 0, 255]);
    }

    #[test]
    fn test_eyelid_clip_keeps_iris_inside() {
        let geometry = EyeGeometry::for_area(EyeShape::Eyelid, 40.0, 1.0).unwrap();
        // looking straight up pushes the iris past the upper lid
        let gaze = compute_gaze(Point::new(0.0, 0.0), Point::new(0.0, -100.0), &geometry);
        let list = build_eye(EyeShape::Eyelid, &gaze, &filled_style(), false, 60.0, 40.0);

        let clipped = rasterize(&list).unwrap();
        assert_eq!(pixel(&clipped, 30, 7)[3], 0);
        assert_eq!(pixel(&clipped, 30, 14), [0, 0, 0, 255]);

        let mut unclipped = list.clone();
        unclipped.ops.retain(|op| !matches!(op, DrawOp::Clip { .. }));
        let pixmap = rasterize(&unclipped).unwrap();
        assert_eq!(pixel(&pixmap, 30, 7), [0, 0, 255, 255]);
    }

    #[test]
    fn test_empty_area() {
        let list = DrawList {
            width: 0.0,
            height: 10.0,
            scale: (1.0, 1.0),
            ops: Vec::new(),
        };
        assert!(rasterize(&list).is_none());
    }

    #[test]
    fn test_render_svg_icon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.svg");
        std::fs::write(
            &path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><circle cx="32" cy="32" r="30" fill="#ff0000"/></svg>"##,
        )
        .unwrap();

        let image = render_svg(&path, 128).unwrap();
        assert_eq!(image.size, [128, 128]);
        assert_eq!(image.pixels[64 * 128 + 64], egui::Color32::from_rgb(255, 0, 0));
        assert_eq!(image.pixels[0].a(), 0);

        assert!(render_svg(&dir.path().join("missing.svg"), 128).is_none());
    }

    #[test]
    fn test_color_image_size() {
        let pixmap = Pixmap::new(8, 4).unwrap();
        assert_eq!(to_color_image(&pixmap).size, [8, 4]);
    }
}
