//! Settings: validated snapshots plus a typed change registry
//!
//! `EyeSettings` is an immutable snapshot. A change never edits it in
//! place: `SettingsStore::set` validates the new value, builds a new
//! snapshot, swaps it in, and then tells every subscriber of that key.
//! Invalid values are rejected and the previous snapshot stays current.
//!
//! The snapshot is persisted as JSON in the slowOS config directory.

use crate::color::HexColor;
use crate::error::{ConfigResult, ConfigValidationError};
use crate::gaze::EyeShape;
use crate::keybinding::Accelerator;
use serde::{Deserialize, Serialize};
use slowcore::storage;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Smallest allowed gap between the ends of the unsynced blink range.
pub const BLINK_RANGE_GAP: f64 = 0.1;
const RANGE_EPSILON: f64 = 1e-9;

/// Which part of the panel the eyes sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PanelPosition {
    Left,
    #[default]
    Center,
    Right,
}

impl PanelPosition {
    pub const ALL: [PanelPosition; 3] = [PanelPosition::Left, PanelPosition::Center, PanelPosition::Right];

    pub fn name(self) -> &'static str {
        match self {
            PanelPosition::Left => "left",
            PanelPosition::Center => "center",
            PanelPosition::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlinkMode {
    /// Blink only on the keybinding.
    #[default]
    Manual,
    /// All eyes blink together on a fixed period.
    Synced,
    /// Each eye blinks on its own random schedule.
    Unsynced,
}

impl BlinkMode {
    pub const ALL: [BlinkMode; 3] = [BlinkMode::Manual, BlinkMode::Synced, BlinkMode::Unsynced];

    pub fn name(self) -> &'static str {
        match self {
            BlinkMode::Manual => "manual",
            BlinkMode::Synced => "synced",
            BlinkMode::Unsynced => "unsynced",
        }
    }
}

fn enum_from_name<T: Copy>(all: &[T], name_of: fn(T) -> &'static str, key: &'static str, text: &str) -> ConfigResult<T> {
    all.iter()
        .copied()
        .find(|v| name_of(*v) == text)
        .ok_or_else(|| ConfigValidationError::UnknownVariant {
            key,
            value: text.to_string(),
        })
}

/// Bounds of the random delay between unsynced blinks, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct BlinkRange {
    min: f64,
    max: f64,
}

impl BlinkRange {
    pub fn new(min: f64, max: f64) -> ConfigResult<Self> {
        check_f64("eye-blink-interval-range", min, 0.5, 59.9)?;
        check_f64("eye-blink-interval-range", max, 0.6, 60.0)?;
        if max - min < BLINK_RANGE_GAP - RANGE_EPSILON {
            return Err(ConfigValidationError::InvalidRange {
                min,
                max,
                gap: BLINK_RANGE_GAP,
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl TryFrom<[f64; 2]> for BlinkRange {
    type Error = ConfigValidationError;

    fn try_from([min, max]: [f64; 2]) -> ConfigResult<Self> {
        Self::new(min, max)
    }
}

impl From<BlinkRange> for [f64; 2] {
    fn from(range: BlinkRange) -> [f64; 2] {
        [range.min, range.max]
    }
}

/// A glyph name usable as a single file name component.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(&['/', '\\'][..]) && !name.contains("..")
}

fn check_f64(key: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<f64> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigValidationError::OutOfRange { key, min, max, value })
    }
}

fn check_int(key: &'static str, value: i64, min: u32, max: u32) -> ConfigResult<u32> {
    if value >= i64::from(min) && value <= i64::from(max) {
        Ok(value as u32)
    } else {
        Err(ConfigValidationError::OutOfRange {
            key,
            min: f64::from(min),
            max: f64::from(max),
            value: value as f64,
        })
    }
}

/// Every setting, by its schema name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    EyePosition,
    EyeIndex,
    EyeCount,
    EyeReactive,
    EyeShape,
    EyeLineMode,
    EyeLineWidth,
    EyeWidth,
    EyeColorIrisEnabled,
    EyeColorIris,
    EyeColorEyelid,
    EyeRepaintInterval,
    EyeBlinkMode,
    EyeBlinkInterval,
    EyeBlinkIntervalRange,
    EyeBlinkKeybinding,
    TrackerShape,
    TrackerSize,
    TrackerColor,
    TrackerColorLeft,
    TrackerColorMiddle,
    TrackerColorRight,
    TrackerOpacity,
    TrackerRepaintInterval,
    TrackerKeybinding,
}

impl SettingKey {
    pub const ALL: [SettingKey; 25] = [
        SettingKey::EyePosition,
        SettingKey::EyeIndex,
        SettingKey::EyeCount,
        SettingKey::EyeReactive,
        SettingKey::EyeShape,
        SettingKey::EyeLineMode,
        SettingKey::EyeLineWidth,
        SettingKey::EyeWidth,
        SettingKey::EyeColorIrisEnabled,
        SettingKey::EyeColorIris,
        SettingKey::EyeColorEyelid,
        SettingKey::EyeRepaintInterval,
        SettingKey::EyeBlinkMode,
        SettingKey::EyeBlinkInterval,
        SettingKey::EyeBlinkIntervalRange,
        SettingKey::EyeBlinkKeybinding,
        SettingKey::TrackerShape,
        SettingKey::TrackerSize,
        SettingKey::TrackerColor,
        SettingKey::TrackerColorLeft,
        SettingKey::TrackerColorMiddle,
        SettingKey::TrackerColorRight,
        SettingKey::TrackerOpacity,
        SettingKey::TrackerRepaintInterval,
        SettingKey::TrackerKeybinding,
    ];

    /// Keys that change which eyes exist or where they sit.
    pub const PLACEMENT: [SettingKey; 4] = [
        SettingKey::EyePosition,
        SettingKey::EyeIndex,
        SettingKey::EyeCount,
        SettingKey::EyeReactive,
    ];

    /// Keys that change how each eye is drawn.
    pub const EYE_DRAWING: [SettingKey; 8] = [
        SettingKey::EyeShape,
        SettingKey::EyeLineMode,
        SettingKey::EyeLineWidth,
        SettingKey::EyeWidth,
        SettingKey::EyeColorIrisEnabled,
        SettingKey::EyeColorIris,
        SettingKey::EyeColorEyelid,
        SettingKey::EyeRepaintInterval,
    ];

    pub const TRACKER: [SettingKey; 8] = [
        SettingKey::TrackerShape,
        SettingKey::TrackerSize,
        SettingKey::TrackerColor,
        SettingKey::TrackerColorLeft,
        SettingKey::TrackerColorMiddle,
        SettingKey::TrackerColorRight,
        SettingKey::TrackerOpacity,
        SettingKey::TrackerRepaintInterval,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::EyePosition => "eye-position",
            SettingKey::EyeIndex => "eye-index",
            SettingKey::EyeCount => "eye-count",
            SettingKey::EyeReactive => "eye-reactive",
            SettingKey::EyeShape => "eye-shape",
            SettingKey::EyeLineMode => "eye-line-mode",
            SettingKey::EyeLineWidth => "eye-line-width",
            SettingKey::EyeWidth => "eye-width",
            SettingKey::EyeColorIrisEnabled => "eye-color-iris-enabled",
            SettingKey::EyeColorIris => "eye-color-iris",
            SettingKey::EyeColorEyelid => "eye-color-eyelid",
            SettingKey::EyeRepaintInterval => "eye-repaint-interval",
            SettingKey::EyeBlinkMode => "eye-blink-mode",
            SettingKey::EyeBlinkInterval => "eye-blink-interval",
            SettingKey::EyeBlinkIntervalRange => "eye-blink-interval-range",
            SettingKey::EyeBlinkKeybinding => "eye-blink-keybinding",
            SettingKey::TrackerShape => "tracker-shape",
            SettingKey::TrackerSize => "tracker-size",
            SettingKey::TrackerColor => "tracker-color",
            SettingKey::TrackerColorLeft => "tracker-color-left",
            SettingKey::TrackerColorMiddle => "tracker-color-middle",
            SettingKey::TrackerColorRight => "tracker-color-right",
            SettingKey::TrackerOpacity => "tracker-opacity",
            SettingKey::TrackerRepaintInterval => "tracker-repaint-interval",
            SettingKey::TrackerKeybinding => "tracker-keybinding",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A setting value, loosely typed as it comes from a settings UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Range(f64, f64),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers, and doubles with no fractional part (spin buttons report
    /// doubles).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            SettingValue::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            SettingValue::Double(d) => Some(*d),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            SettingValue::Range(a, b) => Some((*a, *b)),
            _ => None,
        }
    }

    /// A value as stored in the settings file. Ranges are two-element
    /// arrays; anything else that is not a scalar has no setting value.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Some(SettingValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(SettingValue::Int)
                .or_else(|| n.as_f64().map(SettingValue::Double)),
            Value::String(s) => Some(SettingValue::Str(s.clone())),
            Value::Array(items) => match items.as_slice() {
                [min, max] => Some(SettingValue::Range(min.as_f64()?, max.as_f64()?)),
                _ => None,
            },
            Value::Null | Value::Object(_) => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Double(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Str(v.to_string())
    }
}

/// All settings of the eyes and the tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EyeSettings {
    pub eye_position: PanelPosition,
    /// Slot of the first eye within its panel segment (0-100)
    pub eye_index: u32,
    /// Number of eyes (1-100)
    pub eye_count: u32,
    /// Whether the eyes react to clicks
    pub eye_reactive: bool,
    pub eye_shape: EyeShape,
    /// Draw outlines instead of filled shapes
    pub eye_line_mode: bool,
    /// Outline width in tenths of a pixel (0-50)
    pub eye_line_width: u32,
    /// Drawing area width in pixels (20-1000)
    pub eye_width: u32,
    pub eye_color_iris_enabled: bool,
    pub eye_color_iris: HexColor,
    pub eye_color_eyelid: HexColor,
    /// Milliseconds between pointer checks (5-1000)
    pub eye_repaint_interval: u32,
    pub eye_blink_mode: BlinkMode,
    /// Seconds between synced blinks (0.5-60)
    pub eye_blink_interval: f64,
    pub eye_blink_interval_range: BlinkRange,
    pub eye_blink_keybinding: String,
    /// Name of the glyph template, without `.svg`
    pub tracker_shape: String,
    /// Icon size in pixels (128-1024)
    pub tracker_size: u32,
    pub tracker_color: HexColor,
    pub tracker_color_left: HexColor,
    pub tracker_color_middle: HexColor,
    pub tracker_color_right: HexColor,
    /// Percent (0-100)
    pub tracker_opacity: u32,
    /// Milliseconds between position updates (5-1000)
    pub tracker_repaint_interval: u32,
    pub tracker_keybinding: String,
}

impl Default for EyeSettings {
    fn default() -> Self {
        Self {
            eye_position: PanelPosition::Center,
            eye_index: 0,
            eye_count: 2,
            eye_reactive: true,
            eye_shape: EyeShape::Round,
            eye_line_mode: true,
            eye_line_width: 15,
            eye_width: 48,
            eye_color_iris_enabled: false,
            eye_color_iris: HexColor::from_rgb(0x34, 0x65, 0xa4),
            eye_color_eyelid: HexColor::from_rgb(0xe0, 0xb0, 0x88),
            eye_repaint_interval: 30,
            eye_blink_mode: BlinkMode::Manual,
            eye_blink_interval: 4.0,
            eye_blink_interval_range: BlinkRange { min: 2.0, max: 6.0 },
            eye_blink_keybinding: "<Control>b".to_string(),
            tracker_shape: "circle".to_string(),
            tracker_size: 128,
            tracker_color: HexColor::from_rgb(0xff, 0xdd, 0x00),
            tracker_color_left: HexColor::from_rgb(0xff, 0x00, 0x00),
            tracker_color_middle: HexColor::from_rgb(0x00, 0xc0, 0x00),
            tracker_color_right: HexColor::from_rgb(0x00, 0x60, 0xff),
            tracker_opacity: 60,
            tracker_repaint_interval: 16,
            tracker_keybinding: "<Control>t".to_string(),
        }
    }
}

impl EyeSettings {
    /// Outline width in pixels.
    pub fn line_width_px(&self) -> f64 {
        f64::from(self.eye_line_width) / 10.0
    }

    /// Read one setting generically.
    pub fn get(&self, key: SettingKey) -> SettingValue {
        use SettingKey as K;
        match key {
            K::EyePosition => self.eye_position.name().into(),
            K::EyeIndex => i64::from(self.eye_index).into(),
            K::EyeCount => i64::from(self.eye_count).into(),
            K::EyeReactive => self.eye_reactive.into(),
            K::EyeShape => self.eye_shape.name().into(),
            K::EyeLineMode => self.eye_line_mode.into(),
            K::EyeLineWidth => i64::from(self.eye_line_width).into(),
            K::EyeWidth => i64::from(self.eye_width).into(),
            K::EyeColorIrisEnabled => self.eye_color_iris_enabled.into(),
            K::EyeColorIris => SettingValue::Str(self.eye_color_iris.to_string()),
            K::EyeColorEyelid => SettingValue::Str(self.eye_color_eyelid.to_string()),
            K::EyeRepaintInterval => i64::from(self.eye_repaint_interval).into(),
            K::EyeBlinkMode => self.eye_blink_mode.name().into(),
            K::EyeBlinkInterval => self.eye_blink_interval.into(),
            K::EyeBlinkIntervalRange => {
                SettingValue::Range(self.eye_blink_interval_range.min, self.eye_blink_interval_range.max)
            }
            K::EyeBlinkKeybinding => self.eye_blink_keybinding.as_str().into(),
            K::TrackerShape => self.tracker_shape.as_str().into(),
            K::TrackerSize => i64::from(self.tracker_size).into(),
            K::TrackerColor => SettingValue::Str(self.tracker_color.to_string()),
            K::TrackerColorLeft => SettingValue::Str(self.tracker_color_left.to_string()),
            K::TrackerColorMiddle => SettingValue::Str(self.tracker_color_middle.to_string()),
            K::TrackerColorRight => SettingValue::Str(self.tracker_color_right.to_string()),
            K::TrackerOpacity => i64::from(self.tracker_opacity).into(),
            K::TrackerRepaintInterval => i64::from(self.tracker_repaint_interval).into(),
            K::TrackerKeybinding => self.tracker_keybinding.as_str().into(),
        }
    }

    /// A copy of this snapshot with `key` set to `value`, or the reason the
    /// value is not acceptable. `known_shapes` lists the available tracker
    /// glyphs; when empty, any non-empty shape name is accepted.
    pub fn with(&self, key: SettingKey, value: &SettingValue, known_shapes: &[String]) -> ConfigResult<Self> {
        use SettingKey as K;
        let name = key.name();
        let wrong = |expected| ConfigValidationError::WrongType { key: name, expected };
        let int = |min, max| check_int(name, value.as_int().ok_or_else(|| wrong("integer"))?, min, max);
        let text = || value.as_str().ok_or_else(|| wrong("string"));
        let color = || HexColor::parse(name, text()?);
        let flag = || value.as_bool().ok_or_else(|| wrong("boolean"));
        let accel = || -> ConfigResult<String> {
            let s = text()?;
            Accelerator::parse(s)?;
            Ok(s.trim().to_string())
        };

        let mut next = self.clone();
        match key {
            K::EyePosition => {
                next.eye_position = enum_from_name(&PanelPosition::ALL, PanelPosition::name, name, text()?)?
            }
            K::EyeIndex => next.eye_index = int(0, 100)?,
            K::EyeCount => next.eye_count = int(1, 100)?,
            K::EyeReactive => next.eye_reactive = flag()?,
            K::EyeShape => {
                let text = text()?;
                next.eye_shape = EyeShape::from_name(text).ok_or_else(|| ConfigValidationError::UnknownVariant {
                    key: name,
                    value: text.to_string(),
                })?;
            }
            K::EyeLineMode => next.eye_line_mode = flag()?,
            K::EyeLineWidth => next.eye_line_width = int(0, 50)?,
            K::EyeWidth => next.eye_width = int(20, 1000)?,
            K::EyeColorIrisEnabled => next.eye_color_iris_enabled = flag()?,
            K::EyeColorIris => next.eye_color_iris = color()?,
            K::EyeColorEyelid => next.eye_color_eyelid = color()?,
            K::EyeRepaintInterval => next.eye_repaint_interval = int(5, 1000)?,
            K::EyeBlinkMode => next.eye_blink_mode = enum_from_name(&BlinkMode::ALL, BlinkMode::name, name, text()?)?,
            K::EyeBlinkInterval => {
                let v = value.as_double().ok_or_else(|| wrong("double"))?;
                next.eye_blink_interval = check_f64(name, v, 0.5, 60.0)?;
            }
            K::EyeBlinkIntervalRange => {
                let (min, max) = value.as_range().ok_or_else(|| wrong("range"))?;
                next.eye_blink_interval_range = BlinkRange::new(min, max)?;
            }
            K::EyeBlinkKeybinding => next.eye_blink_keybinding = accel()?,
            K::TrackerShape => {
                let shape = text()?.trim();
                let known = known_shapes.is_empty() || known_shapes.iter().any(|s| s == shape);
                if !is_plain_name(shape) || !known {
                    return Err(ConfigValidationError::UnknownShape(shape.to_string()));
                }
                next.tracker_shape = shape.to_string();
            }
            K::TrackerSize => next.tracker_size = int(128, 1024)?,
            K::TrackerColor => next.tracker_color = color()?,
            K::TrackerColorLeft => next.tracker_color_left = color()?,
            K::TrackerColorMiddle => next.tracker_color_middle = color()?,
            K::TrackerColorRight => next.tracker_color_right = color()?,
            K::TrackerOpacity => next.tracker_opacity = int(0, 100)?,
            K::TrackerRepaintInterval => next.tracker_repaint_interval = int(5, 1000)?,
            K::TrackerKeybinding => next.tracker_keybinding = accel()?,
        }
        Ok(next)
    }

    /// Re-validate every field of a snapshot read from disk. Fields that do
    /// not pass are reset to their defaults.
    pub fn sanitized(&self, known_shapes: &[String]) -> Self {
        let mut clean = Self::default();
        for key in SettingKey::ALL {
            match clean.with(key, &self.get(key), known_shapes) {
                Ok(next) => clean = next,
                Err(e) => log::warn!("ignoring saved {}: {}", key.name(), e),
            }
        }
        clean
    }

    /// Build a snapshot from a saved settings document, one field at a
    /// time. Missing fields keep their defaults; a field that does not
    /// validate is skipped without touching the others.
    pub fn from_json(doc: &serde_json::Value, known_shapes: &[String]) -> Self {
        let mut settings = Self::default();
        let Some(fields) = doc.as_object() else {
            log::warn!("settings file is not a JSON object, using defaults");
            return settings;
        };
        for (name, raw) in fields {
            let Some(key) = SettingKey::from_name(name) else {
                log::warn!("ignoring unknown setting {}", name);
                continue;
            };
            let Some(value) = SettingValue::from_json(raw) else {
                log::warn!("ignoring saved {}: unsupported value {}", name, raw);
                continue;
            };
            match settings.with(key, &value, known_shapes) {
                Ok(next) => settings = next,
                Err(e) => log::warn!("ignoring saved {}: {}", name, e),
            }
        }
        settings
    }

    /// Keys whose values differ between two snapshots.
    pub fn diff(&self, other: &EyeSettings) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|k| self.get(*k) != other.get(*k))
            .collect()
    }
}

/// Handle returned by [`SettingsStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Called after a subscribed key changed, with the new snapshot.
pub type Listener = Box<dyn FnMut(SettingKey, &Rc<EyeSettings>)>;

struct Subscription {
    id: SubscriptionId,
    keys: Vec<SettingKey>,
    listener: Listener,
}

/// Holds the current snapshot and notifies subscribers of changes.
pub struct SettingsStore {
    current: Rc<EyeSettings>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
    known_shapes: Vec<String>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(settings: EyeSettings) -> Self {
        Self {
            current: Rc::new(settings),
            subscriptions: Vec::new(),
            next_id: 0,
            known_shapes: Vec::new(),
            path: None,
        }
    }

    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        storage::config_dir("sloweyes").join("settings.json")
    }

    /// Load settings from `path`, falling back to defaults for a missing or
    /// unreadable file and for any invalid field.
    pub fn load(path: &Path, known_shapes: Vec<String>) -> Self {
        let loaded = match storage::load_json::<serde_json::Value>(path) {
            Ok(doc) => EyeSettings::from_json(&doc, &known_shapes),
            Err(storage::StorageError::NotFound(_)) => EyeSettings::default(),
            Err(e) => {
                log::warn!("cannot read settings from {}: {}", path.display(), e);
                EyeSettings::default()
            }
        };
        let mut store = Self::new(loaded);
        store.known_shapes = known_shapes;
        store.path = Some(path.to_path_buf());
        store
    }

    /// Write the current snapshot back to the file it was loaded from.
    pub fn save(&self) -> storage::Result<()> {
        match &self.path {
            Some(path) => storage::save_json(path, self.current.as_ref()),
            None => Ok(()),
        }
    }

    pub fn set_known_shapes(&mut self, shapes: Vec<String>) {
        self.known_shapes = shapes;
    }

    pub fn known_shapes(&self) -> &[String] {
        &self.known_shapes
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Rc<EyeSettings> {
        Rc::clone(&self.current)
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        self.current.get(key)
    }

    /// Validate and apply one setting. Returns `Ok(false)` when the value
    /// did not change (nobody is notified).
    pub fn set(&mut self, key: SettingKey, value: impl Into<SettingValue>) -> ConfigResult<bool> {
        let value = value.into();
        let next = match self.current.with(key, &value, &self.known_shapes) {
            Ok(next) => next,
            Err(e) => {
                log::warn!("rejected {} = {:?}: {}", key.name(), value, e);
                return Err(e);
            }
        };
        if next == *self.current {
            return Ok(false);
        }
        log::debug!("{} = {:?}", key.name(), value);
        self.current = Rc::new(next);
        self.notify(&[key]);
        Ok(true)
    }

    /// Swap in a whole snapshot (e.g. reset to defaults) and notify every
    /// key that changed.
    pub fn replace(&mut self, settings: EyeSettings) -> Vec<SettingKey> {
        let settings = settings.sanitized(&self.known_shapes);
        let changed = self.current.diff(&settings);
        if !changed.is_empty() {
            self.current = Rc::new(settings);
            self.notify(&changed);
        }
        changed
    }

    fn notify(&mut self, keys: &[SettingKey]) {
        let snapshot = Rc::clone(&self.current);
        for &key in keys {
            for sub in self.subscriptions.iter_mut().filter(|s| s.keys.contains(&key)) {
                (sub.listener)(key, &snapshot);
            }
        }
    }

    /// Call `listener` whenever any of `keys` changes.
    pub fn subscribe(&mut self, keys: &[SettingKey], listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            keys: keys.to_vec(),
            listener,
        });
        id
    }

    /// Returns false if `id` was not subscribed (already removed).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Drop every subscription. Returns how many there were.
    pub fn unsubscribe_all(&mut self) -> usize {
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        count
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}
