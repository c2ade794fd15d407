//! One eye widget: config snapshot, repaint timer, blink state

use crate::color::HexColor;
use crate::error::ConfigResult;
use crate::gaze::{compute_gaze, EyeGeometry, EyeShape, Point};
use crate::render::{build_eye, DrawList, EyeStyle};
use crate::settings::EyeSettings;
use slowcore::timer::{TimerId, TimerSet};
use std::time::{Duration, Instant};

/// How long a blink keeps the eye shut.
pub const BLINK_DURATION: Duration = Duration::from_millis(150);

/// Iris color of a filled eye with no override and no tracker.
pub const DEFAULT_IRIS: HexColor = HexColor::from_rgb(0x80, 0x80, 0x80);

/// Drawing parameters of one eye, checked once when built.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeConfig {
    pub shape: EyeShape,
    pub line_mode: bool,
    pub iris_override: Option<HexColor>,
    pub eyelid_color: HexColor,
    pub width: f64,
    pub height: f64,
    pub repaint_interval: Duration,
    geometry: EyeGeometry,
}

impl EyeConfig {
    /// Config for an eye drawn `height` pixels tall.
    pub fn from_settings(settings: &EyeSettings, height: f64) -> ConfigResult<Self> {
        let geometry = EyeGeometry::for_area(settings.eye_shape, height, settings.line_width_px())?;
        Ok(Self {
            shape: settings.eye_shape,
            line_mode: settings.eye_line_mode,
            iris_override: settings.eye_color_iris_enabled.then_some(settings.eye_color_iris),
            eyelid_color: settings.eye_color_eyelid,
            width: f64::from(settings.eye_width),
            height,
            repaint_interval: Duration::from_millis(u64::from(settings.eye_repaint_interval)),
            geometry,
        })
    }

    pub fn geometry(&self) -> &EyeGeometry {
        &self.geometry
    }

    pub fn line_width(&self) -> f64 {
        self.geometry.line_width()
    }
}

/// Everything `render` needs from outside the eye, sampled once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFrame {
    /// Top-left corner of the eye's area, in pointer coordinates.
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    pub pointer: Point,
    pub foreground: HexColor,
    /// Tracker color while the tracker is shown.
    pub tracker_color: Option<HexColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EyeTimer {
    Repaint,
    Reopen,
}

pub struct Eye {
    index: usize,
    config: EyeConfig,
    timers: TimerSet<EyeTimer>,
    repaint: Option<TimerId>,
    reopen: Option<TimerId>,
    last_pointer: Option<Point>,
    last_tracker_color: Option<HexColor>,
    disposed: bool,
}

impl Eye {
    pub fn new(index: usize, config: EyeConfig, now: Instant) -> Self {
        let mut eye = Self {
            index,
            config,
            timers: TimerSet::new(),
            repaint: None,
            reopen: None,
            last_pointer: None,
            last_tracker_color: None,
            disposed: false,
        };
        eye.start_repaint(now);
        eye
    }

    fn start_repaint(&mut self, now: Instant) {
        self.timers.stop(&mut self.repaint);
        self.repaint = Some(self.timers.every(EyeTimer::Repaint, self.config.repaint_interval, now));
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &EyeConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.reopen.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    /// Advance the eye's timers. Returns true if it needs to be redrawn:
    /// the pointer moved or the tracker color changed since the last
    /// repaint tick, or a blink just ended.
    pub fn tick(&mut self, now: Instant, pointer: Option<Point>, tracker_color: Option<HexColor>) -> bool {
        let mut dirty = false;
        for (id, timer) in self.timers.poll(now) {
            match timer {
                EyeTimer::Repaint => {
                    if pointer != self.last_pointer || tracker_color != self.last_tracker_color {
                        self.last_pointer = pointer;
                        self.last_tracker_color = tracker_color;
                        dirty = true;
                    }
                }
                EyeTimer::Reopen => {
                    if self.reopen == Some(id) {
                        self.reopen = None;
                    }
                    dirty = true;
                }
            }
        }
        dirty
    }

    /// Shut the eye for [`BLINK_DURATION`].
    pub fn blink(&mut self, now: Instant) {
        if self.disposed {
            return;
        }
        self.timers.stop(&mut self.reopen);
        self.reopen = Some(self.timers.once(EyeTimer::Reopen, BLINK_DURATION, now));
    }

    /// Iris color for this frame.
    pub fn iris_color(&self, frame: &EyeFrame) -> HexColor {
        if let Some(color) = frame.tracker_color {
            color
        } else if let Some(color) = self.config.iris_override {
            color
        } else if self.config.line_mode {
            frame.foreground
        } else {
            DEFAULT_IRIS
        }
    }

    pub fn render(&self, frame: &EyeFrame) -> DrawList {
        let anchor = Point::new(frame.origin.x + frame.width / 2.0, frame.origin.y + frame.height / 2.0);
        let gaze = compute_gaze(anchor, frame.pointer, &self.config.geometry);
        let style = EyeStyle {
            foreground: frame.foreground,
            iris: self.iris_color(frame),
            eyelid: self.config.eyelid_color,
            line_mode: self.config.line_mode,
            line_width: self.config.line_width(),
        };
        build_eye(self.config.shape, &gaze, &style, self.is_closed(), frame.width, frame.height)
    }

    /// Swap in a new config. The repaint timer restarts only if its
    /// interval changed.
    pub fn update_config(&mut self, config: EyeConfig, now: Instant) {
        let restart = config.repaint_interval != self.config.repaint_interval;
        self.config = config;
        // force a redraw on the next tick
        self.last_pointer = None;
        if restart && !self.disposed {
            self.start_repaint(now);
        }
    }

    /// Cancel every timer. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.timers.clear();
        self.repaint = None;
        self.reopen = None;
        self.disposed = true;
        log::debug!("eye {} disposed", self.index);
    }
}

impl Drop for Eye {
    fn drop(&mut self) {
        self.dispose();
    }
}
