//! Eye drawings as plain data
//!
//! `build_eye` turns one frame's gaze into a short list of draw ops in
//! eye-local coordinates (origin at the center of the drawing area, y
//! down). The list is then handed to a drawing surface; see `raster`.

use crate::color::HexColor;
use crate::gaze::{EyeShape, Gaze, Point};

/// Lid bezier depth below the eye axis, as a fraction of the eye radius.
const LOWER_LID_SCALE: f64 = 0.8;
/// Lid bezier depth above the eye axis.
const UPPER_LID_SCALE: f64 = 0.6;
/// How far the shut lid line sags.
const SHUT_LID_SAG: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill(HexColor),
    Stroke { color: HexColor, width: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    MoveTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// An ellipse with radii `(rx, ry)`, rotated by `rotation` radians
    /// about its own center.
    Ellipse {
        center: Point,
        radii: (f64, f64),
        rotation: f64,
        paint: Paint,
    },
    Path {
        segments: Vec<PathSeg>,
        paint: Paint,
    },
    /// Everything after this op is drawn only inside the closed path.
    Clip { segments: Vec<PathSeg> },
}

/// One frame of one eye.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    /// Drawing area size in pixels.
    pub width: f64,
    pub height: f64,
    /// Scale applied around the area center before drawing any op.
    pub scale: (f64, f64),
    pub ops: Vec<DrawOp>,
}

/// Colors and stroke settings resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeStyle {
    /// Eyeball (filled) or outline color.
    pub foreground: HexColor,
    pub iris: HexColor,
    pub eyelid: HexColor,
    /// Draw outlines only.
    pub line_mode: bool,
    pub line_width: f64,
}

impl EyeStyle {
    fn body_paint(&self, color: HexColor) -> Paint {
        if self.line_mode {
            Paint::Stroke {
                color,
                width: self.line_width,
            }
        } else {
            Paint::Fill(color)
        }
    }

    fn pupil_color(&self) -> HexColor {
        if self.line_mode {
            self.iris
        } else {
            HexColor::BLACK
        }
    }
}

fn polar(angle: f64, distance: f64) -> Point {
    Point::new(distance * angle.cos(), distance * angle.sin())
}

fn lid_outline(gaze: &Gaze) -> Vec<PathSeg> {
    let r = gaze.eye_radius;
    let ir = gaze.iris_radius;
    let off = gaze.lid_offset();
    let lower = r * LOWER_LID_SCALE;
    let upper = r * UPPER_LID_SCALE;

    vec![
        PathSeg::MoveTo(Point::new(-r, 0.0)),
        PathSeg::CubicTo(
            Point::new(off.x - ir, off.y + lower),
            Point::new(off.x + ir, off.y + lower),
            Point::new(r, 0.0),
        ),
        PathSeg::CubicTo(
            Point::new(off.x + ir, off.y - upper),
            Point::new(off.x - ir, off.y - upper),
            Point::new(-r, 0.0),
        ),
        PathSeg::Close,
    ]
}

fn shut_lid_line(radius: f64) -> Vec<PathSeg> {
    let sag = radius * SHUT_LID_SAG;
    vec![
        PathSeg::MoveTo(Point::new(-radius, 0.0)),
        PathSeg::CubicTo(
            Point::new(-radius * 0.5, sag),
            Point::new(radius * 0.5, sag),
            Point::new(radius, 0.0),
        ),
    ]
}

fn iris_and_pupil(gaze: &Gaze, style: &EyeStyle, ops: &mut Vec<DrawOp>) {
    let squash = gaze.squash();
    ops.push(DrawOp::Ellipse {
        center: polar(gaze.angle, gaze.iris_offset()),
        radii: (gaze.iris_radius * squash, gaze.iris_radius),
        rotation: gaze.angle,
        paint: style.body_paint(style.iris),
    });
    ops.push(DrawOp::Ellipse {
        center: polar(gaze.angle, gaze.pupil_offset()),
        radii: (gaze.pupil_radius * squash, gaze.pupil_radius),
        rotation: gaze.angle,
        paint: Paint::Fill(style.pupil_color()),
    });
}

/// Build the draw ops for one eye.
///
/// A `closed` eye (mid-blink) shows the lid in the eyelid color with a
/// shut-lid line instead of the iris and pupil.
pub fn build_eye(shape: EyeShape, gaze: &Gaze, style: &EyeStyle, closed: bool, width: f64, height: f64) -> DrawList {
    let r = gaze.eye_radius;
    let lid_stroke = Paint::Stroke {
        color: style.foreground,
        width: style.line_width.max(1.0),
    };
    let mut ops = Vec::with_capacity(5);

    match shape {
        EyeShape::Round | EyeShape::Comic => {
            if closed {
                ops.push(DrawOp::Ellipse {
                    center: Point::default(),
                    radii: (r, r),
                    rotation: 0.0,
                    paint: Paint::Fill(style.eyelid),
                });
                ops.push(DrawOp::Ellipse {
                    center: Point::default(),
                    radii: (r, r),
                    rotation: 0.0,
                    paint: lid_stroke,
                });
                ops.push(DrawOp::Path {
                    segments: shut_lid_line(r),
                    paint: lid_stroke,
                });
            } else {
                ops.push(DrawOp::Ellipse {
                    center: Point::default(),
                    radii: (r, r),
                    rotation: 0.0,
                    paint: style.body_paint(style.foreground),
                });
                iris_and_pupil(gaze, style, &mut ops);
            }
        }
        EyeShape::Eyelid => {
            let outline = lid_outline(gaze);
            if closed {
                ops.push(DrawOp::Path {
                    segments: outline.clone(),
                    paint: Paint::Fill(style.eyelid),
                });
                ops.push(DrawOp::Path {
                    segments: outline,
                    paint: lid_stroke,
                });
                ops.push(DrawOp::Path {
                    segments: shut_lid_line(r),
                    paint: lid_stroke,
                });
            } else {
                ops.push(DrawOp::Path {
                    segments: outline.clone(),
                    paint: style.body_paint(style.foreground),
                });
                ops.push(DrawOp::Clip { segments: outline });
                iris_and_pupil(gaze, style, &mut ops);
            }
        }
    }

    DrawList {
        width,
        height,
        scale: shape.frame_scale(),
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::{compute_gaze, EyeGeometry};

    fn style(line_mode: bool) -> EyeStyle {
        EyeStyle {
            foreground: HexColor::from_rgb(10, 10, 10),
            iris: HexColor::from_rgb(0, 0, 200),
            eyelid: HexColor::from_rgb(200, 150, 120),
            line_mode,
            line_width: 1.0,
        }
    }

    fn gaze_right(shape: EyeShape) -> Gaze {
        let geometry = EyeGeometry::new(shape, 10.0, 0.6, 1.0).unwrap();
        compute_gaze(Point::new(0.0, 0.0), Point::new(100.0, 0.0), &geometry)
    }

    #[test]
    fn test_round_eye_ops() {
        let gaze = gaze_right(EyeShape::Round);
        let list = build_eye(EyeShape::Round, &gaze, &style(false), false, 30.0, 23.0);

        assert_eq!(list.scale, (0.95, 0.95));
        assert_eq!(list.ops.len(), 3);
        let DrawOp::Ellipse { center, radii, paint, .. } = &list.ops[1] else {
            panic!("iris should be an ellipse");
        };
        // looking right: iris moved right along x only
        assert!((center.x - gaze.iris_offset()).abs() < 1e-9);
        assert!(center.y.abs() < 1e-9);
        assert!(radii.0 < radii.1);
        assert_eq!(*paint, Paint::Fill(HexColor::from_rgb(0, 0, 200)));
        assert!(matches!(list.ops[2], DrawOp::Ellipse { paint: Paint::Fill(HexColor::BLACK), .. }));
    }

    #[test]
    fn test_line_mode_strokes_body_and_iris() {
        let gaze = gaze_right(EyeShape::Round);
        let list = build_eye(EyeShape::Round, &gaze, &style(true), false, 30.0, 23.0);

        assert!(matches!(list.ops[0], DrawOp::Ellipse { paint: Paint::Stroke { .. }, .. }));
        assert!(matches!(list.ops[1], DrawOp::Ellipse { paint: Paint::Stroke { .. }, .. }));
        // pupil stays filled, in the iris color
        assert!(matches!(
            list.ops[2],
            DrawOp::Ellipse { paint: Paint::Fill(c), .. } if c == HexColor::from_rgb(0, 0, 200)
        ));
    }

    #[test]
    fn test_eyelid_clips_iris() {
        let gaze = gaze_right(EyeShape::Eyelid);
        let list = build_eye(EyeShape::Eyelid, &gaze, &style(false), false, 30.0, 20.0);

        assert!(matches!(list.ops[0], DrawOp::Path { .. }));
        assert!(matches!(list.ops[1], DrawOp::Clip { .. }));
        assert_eq!(list.ops.len(), 4);
    }

    #[test]
    fn test_closed_eye_hides_iris() {
        for shape in EyeShape::ALL {
            let gaze = gaze_right(shape);
            let list = build_eye(shape, &gaze, &style(false), true, 30.0, 20.0);
            let eyelid_fill = list.ops.iter().any(|op| match op {
                DrawOp::Ellipse { paint, .. } | DrawOp::Path { paint, .. } => {
                    *paint == Paint::Fill(HexColor::from_rgb(200, 150, 120))
                }
                DrawOp::Clip { .. } => false,
            });
            assert!(eyelid_fill, "{shape:?}");
            assert!(!list.ops.iter().any(|op| matches!(op, DrawOp::Clip { .. })));
            assert!(!list.ops.iter().any(|op| matches!(
                op,
                DrawOp::Ellipse { paint: Paint::Fill(HexColor::BLACK), .. }
            )));
        }
    }

    #[test]
    fn test_lid_follows_gaze() {
        let geometry = EyeGeometry::new(EyeShape::Eyelid, 10.0, 0.5, 1.0).unwrap();
        let up = compute_gaze(Point::new(0.0, 0.0), Point::new(0.0, -100.0), &geometry);
        let outline = lid_outline(&up);
        let PathSeg::CubicTo(c1, _, _) = outline[1] else {
            panic!("expected a curve");
        };
        // looking up pulls the lid control points up
        assert!(c1.y < 10.0 * LOWER_LID_SCALE);
    }
}
