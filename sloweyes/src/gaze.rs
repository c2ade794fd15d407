//! Gaze geometry: where the iris and pupil sit for a given pointer
//!
//! The eye is modelled as a ball of radius `eye_radius` seen from the
//! front. The pointer direction gives the angle, the pointer distance
//! (clamped so the iris stays inside the outline) gives how far the ball
//! turns. Iris and pupil are then circles on the ball's surface, pushed
//! out along the gaze axis and squashed by the turn angle.
//!
//! Everything here is pure: same inputs, same outputs, every frame.

use crate::error::{ConfigResult, ConfigValidationError};
use serde::{Deserialize, Serialize};

/// Pupil radius as a fraction of the iris radius.
pub const PUPIL_SCALE: f64 = 0.4;

/// Outline of the eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EyeShape {
    #[default]
    Round,
    Eyelid,
    /// A round eye drawn tall and narrow.
    Comic,
}

impl EyeShape {
    pub const ALL: [EyeShape; 3] = [EyeShape::Round, EyeShape::Eyelid, EyeShape::Comic];

    pub fn name(self) -> &'static str {
        match self {
            EyeShape::Round => "round",
            EyeShape::Eyelid => "eyelid",
            EyeShape::Comic => "comic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Eye radius for a drawing area of the given height.
    fn radius_for_height(self, height: f64) -> f64 {
        match self {
            EyeShape::Eyelid => height / 2.0,
            EyeShape::Round | EyeShape::Comic => height / 2.3,
        }
    }

    /// Iris radius as a fraction of the eye radius.
    fn iris_scale(self) -> f64 {
        match self {
            EyeShape::Eyelid => 0.5,
            EyeShape::Round | EyeShape::Comic => 0.65,
        }
    }

    /// Scale applied to the whole drawing frame.
    pub fn frame_scale(self) -> (f64, f64) {
        match self {
            EyeShape::Round => (0.95, 0.95),
            EyeShape::Comic => (0.6, 0.9),
            EyeShape::Eyelid => (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Radii of one eye, checked so that the gaze math is always defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeGeometry {
    shape: EyeShape,
    eye_radius: f64,
    iris_radius: f64,
    pupil_radius: f64,
    line_width: f64,
}

impl EyeGeometry {
    /// Build a geometry from an explicit eye radius and iris scale.
    ///
    /// Rejects anything that would make `asin(iris / eye)` undefined or
    /// leave the iris no room to move.
    pub fn new(shape: EyeShape, eye_radius: f64, iris_scale: f64, line_width: f64) -> ConfigResult<Self> {
        let reject = |why: String| Err(ConfigValidationError::DegenerateGeometry(why));

        if !eye_radius.is_finite() || eye_radius <= 0.0 {
            return reject(format!("eye radius {eye_radius} must be positive"));
        }
        if !iris_scale.is_finite() || iris_scale <= 0.0 || iris_scale >= 1.0 {
            return reject(format!("iris scale {iris_scale} must be inside (0, 1)"));
        }
        if !line_width.is_finite() || line_width < 0.0 {
            return reject(format!("line width {line_width} must not be negative"));
        }

        let iris_radius = eye_radius * iris_scale;
        let geometry = Self {
            shape,
            eye_radius,
            iris_radius,
            pupil_radius: iris_radius * PUPIL_SCALE,
            line_width,
        };
        if shape != EyeShape::Eyelid && geometry.round_max_radius() < 0.0 {
            return reject(format!(
                "line width {line_width} leaves no room for the iris in a radius {eye_radius} eye"
            ));
        }
        Ok(geometry)
    }

    /// Geometry of an eye drawn in an area `height` pixels tall, using the
    /// proportions of each shape.
    pub fn for_area(shape: EyeShape, height: f64, line_width: f64) -> ConfigResult<Self> {
        Self::new(shape, shape.radius_for_height(height), shape.iris_scale(), line_width)
    }

    pub fn shape(&self) -> EyeShape {
        self.shape
    }

    pub fn eye_radius(&self) -> f64 {
        self.eye_radius
    }

    pub fn iris_radius(&self) -> f64 {
        self.iris_radius
    }

    pub fn pupil_radius(&self) -> f64 {
        self.pupil_radius
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// Distance from the eye center to the iris center when fully turned.
    fn iris_x(&self) -> f64 {
        let iris_arc = (self.iris_radius / self.eye_radius).asin();
        self.eye_radius * iris_arc.cos()
    }

    fn round_max_radius(&self) -> f64 {
        self.iris_x() - self.line_width
    }

    /// How far the gaze may travel in direction `angle`.
    pub fn max_radius(&self, angle: f64) -> f64 {
        match self.shape {
            EyeShape::Round | EyeShape::Comic => self.round_max_radius(),
            // the lid narrows vertical travel more than horizontal
            EyeShape::Eyelid => self.eye_radius * (angle.cos().powi(4) * 0.5 + 0.25),
        }
    }
}

/// Where the eye is looking this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaze {
    /// Direction of the pointer from the eye center, radians.
    pub angle: f64,
    /// Pointer distance clamped to `max_radius`.
    pub radius: f64,
    pub max_radius: f64,
    /// How far the ball turned, radians.
    pub eye_angle: f64,
    pub eye_radius: f64,
    pub iris_radius: f64,
    pub pupil_radius: f64,
    pub iris_x: f64,
}

impl Gaze {
    /// Iris center distance along the gaze axis.
    pub fn iris_offset(&self) -> f64 {
        self.iris_x * self.eye_angle.sin()
    }

    /// Pupil center distance along the gaze axis.
    pub fn pupil_offset(&self) -> f64 {
        self.eye_radius * self.eye_angle.sin()
    }

    /// Foreshortening of iris and pupil along the gaze axis.
    pub fn squash(&self) -> f64 {
        self.eye_angle.cos()
    }

    /// Shift of the eyelid control points toward the gaze.
    pub fn lid_offset(&self) -> Point {
        let k = self.iris_radius * self.eye_angle.sin();
        Point::new(k * self.angle.cos(), k * self.angle.sin())
    }
}

/// Compute the gaze of an eye centered at `anchor` looking at `pointer`.
pub fn compute_gaze(anchor: Point, pointer: Point, geometry: &EyeGeometry) -> Gaze {
    let dx = pointer.x - anchor.x;
    let dy = pointer.y - anchor.y;

    let angle = dy.atan2(dx);
    let max_radius = geometry.max_radius(angle);
    let radius = (dx * dx + dy * dy).sqrt().min(max_radius);

    let iris_x = geometry.iris_x();
    let eye_angle = (radius / iris_x).atan();

    Gaze {
        angle,
        radius,
        max_radius,
        eye_angle,
        eye_radius: geometry.eye_radius,
        iris_radius: geometry.iris_radius,
        pupil_radius: geometry.pupil_radius,
        iris_x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn round_10() -> EyeGeometry {
        EyeGeometry::new(EyeShape::Round, 10.0, 0.6, 1.0).unwrap()
    }

    #[test]
    fn test_worked_example() {
        let anchor = Point::new(100.0, 100.0);
        let gaze = compute_gaze(anchor, Point::new(200.0, 100.0), &round_10());

        assert!(gaze.angle.abs() < EPS);
        assert!((gaze.max_radius - 7.0).abs() < EPS);
        assert!((gaze.radius - 7.0).abs() < EPS);
        assert!((gaze.iris_radius - 6.0).abs() < EPS);
        assert!((gaze.pupil_radius - 2.4).abs() < EPS);
        assert!((gaze.eye_angle - (7.0f64 / 8.0).atan()).abs() < EPS);
    }

    #[test]
    fn test_pointer_inside_is_not_clamped() {
        let gaze = compute_gaze(Point::new(0.0, 0.0), Point::new(3.0, 4.0), &round_10());
        assert!((gaze.radius - 5.0).abs() < EPS);
    }

    #[test]
    fn test_pointer_on_anchor_looks_straight() {
        let gaze = compute_gaze(Point::new(5.0, 5.0), Point::new(5.0, 5.0), &round_10());
        assert_eq!(gaze.radius, 0.0);
        assert_eq!(gaze.eye_angle, 0.0);
        assert_eq!(gaze.iris_offset(), 0.0);
        assert_eq!(gaze.squash(), 1.0);
    }

    #[test]
    fn test_clamp_holds_everywhere() {
        let anchor = Point::new(0.0, 0.0);
        for shape in EyeShape::ALL {
            let geometry = EyeGeometry::for_area(shape, 28.0, 1.5).unwrap();
            for step in 0..72 {
                let a = step as f64 * std::f64::consts::TAU / 72.0;
                for dist in [0.5, 3.0, 10.0, 100.0, 5000.0] {
                    let pointer = Point::new(dist * a.cos(), dist * a.sin());
                    let gaze = compute_gaze(anchor, pointer, &geometry);
                    assert!(gaze.radius <= gaze.max_radius + EPS, "{shape:?} {a} {dist}");
                    assert!(gaze.eye_angle.is_finite());
                }
            }
        }
    }

    #[test]
    fn test_far_pointer_hits_shape_maximum() {
        let geometry = EyeGeometry::for_area(EyeShape::Eyelid, 20.0, 1.0).unwrap();
        let anchor = Point::new(0.0, 0.0);

        // straight right: cos^4 = 1, travel is 0.75 of the radius
        let right = compute_gaze(anchor, Point::new(1e4, 0.0), &geometry);
        assert!((right.radius - 7.5).abs() < EPS);

        // straight down: cos^4 = 0, travel is 0.25 of the radius
        let down = compute_gaze(anchor, Point::new(0.0, 1e4), &geometry);
        assert!((down.radius - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_and_order_independent() {
        let a = EyeGeometry::for_area(EyeShape::Round, 30.0, 1.0).unwrap();
        let b = EyeGeometry::for_area(EyeShape::Eyelid, 30.0, 1.0).unwrap();
        let p = Point::new(321.0, -45.0);

        let first = compute_gaze(Point::new(10.0, 10.0), p, &a);
        let _other = compute_gaze(Point::new(60.0, 10.0), p, &b);
        let again = compute_gaze(Point::new(10.0, 10.0), p, &a);
        assert_eq!(first, again);
    }

    #[test]
    fn test_rejects_iris_as_large_as_eye() {
        assert!(matches!(
            EyeGeometry::new(EyeShape::Round, 10.0, 1.0, 1.0),
            Err(ConfigValidationError::DegenerateGeometry(_))
        ));
        assert!(EyeGeometry::new(EyeShape::Round, 10.0, 1.5, 1.0).is_err());
        assert!(EyeGeometry::new(EyeShape::Round, 0.0, 0.5, 1.0).is_err());
        assert!(EyeGeometry::new(EyeShape::Round, f64::NAN, 0.5, 1.0).is_err());
        assert!(EyeGeometry::new(EyeShape::Round, 10.0, 0.5, -1.0).is_err());
    }

    #[test]
    fn test_rejects_line_wider_than_travel() {
        // iris_x is 8, a 9px line leaves nothing
        assert!(EyeGeometry::new(EyeShape::Round, 10.0, 0.6, 9.0).is_err());
        // the eyelid clamp ignores the line width
        assert!(EyeGeometry::new(EyeShape::Eyelid, 10.0, 0.6, 9.0).is_ok());
    }

    #[test]
    fn test_shape_names_roundtrip() {
        for shape in EyeShape::ALL {
            assert_eq!(EyeShape::from_name(shape.name()), Some(shape));
        }
        assert_eq!(EyeShape::from_name("square"), None);
        assert_eq!(serde_json::to_string(&EyeShape::Eyelid).unwrap(), "\"eyelid\"");
    }
}
