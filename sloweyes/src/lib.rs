//! sloweyes: eyes that follow the pointer, and a pointer tracker
//!
//! The core is host-independent: gaze math, draw lists, the tracker icon
//! cache and the blink scheduler take the current `Instant` and pointer as
//! arguments, so they run the same under eframe and under a test clock.

pub mod blink;
pub mod color;
pub mod error;
pub mod eye;
pub mod gaze;
pub mod keybinding;
pub mod notify;
pub mod raster;
pub mod render;
pub mod settings;
pub mod tracker;

pub use blink::{BlinkEvent, BlinkScheduler};
pub use error::{CacheCreationError, ConfigValidationError};
pub use eye::{Eye, EyeConfig, EyeFrame};
pub use gaze::{compute_gaze, EyeGeometry, EyeShape, Gaze, Point};
pub use settings::{EyeSettings, SettingKey, SettingsStore};
pub use tracker::{IconCache, TrackerManager};
