//! Pointer tracker: a colored glyph that follows the pointer
//!
//! Glyph templates are SVG files in the glyph directory whose first
//! `#000000` marks the color to paint. `IconCache` writes one colored copy
//! per (shape, color) into the cache directory and never writes the same
//! key twice. `TrackerManager` owns everything else: which icon is shown,
//! where, and the click highlight timers.

use crate::color::HexColor;
use crate::error::CacheCreationError;
use crate::gaze::Point;
use crate::notify::Notifier;
use crate::settings::EyeSettings;
use slowcore::timer::{TimerId, TimerSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Color placeholder in glyph templates.
const SENTINEL: &str = "#000000";
const RELEASE_DEBOUNCE: Duration = Duration::from_millis(50);
const HIGHLIGHT_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Default,
    Left,
    Middle,
    Right,
}

impl ColorSlot {
    /// Slot for a pointer button number (1 left, 2 middle, 3 right).
    pub fn from_button(button: u8) -> Option<Self> {
        match button {
            1 => Some(ColorSlot::Left),
            2 => Some(ColorSlot::Middle),
            3 => Some(ColorSlot::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerColorSet {
    pub default: HexColor,
    pub left: HexColor,
    pub middle: HexColor,
    pub right: HexColor,
}

impl TrackerColorSet {
    pub fn from_settings(settings: &EyeSettings) -> Self {
        Self {
            default: settings.tracker_color,
            left: settings.tracker_color_left,
            middle: settings.tracker_color_middle,
            right: settings.tracker_color_right,
        }
    }

    pub fn get(&self, slot: ColorSlot) -> HexColor {
        match slot {
            ColorSlot::Default => self.default,
            ColorSlot::Left => self.left,
            ColorSlot::Middle => self.middle,
            ColorSlot::Right => self.right,
        }
    }

    /// Colors in use, without duplicates.
    pub fn distinct(&self) -> Vec<HexColor> {
        let mut colors = Vec::with_capacity(4);
        for c in [self.default, self.left, self.middle, self.right] {
            if !colors.contains(&c) {
                colors.push(c);
            }
        }
        colors
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIcon {
    pub path: PathBuf,
    /// False if the icon already existed.
    pub created: bool,
}

/// Sorted names of the glyph templates in `glyph_dir`.
pub fn available_shapes(glyph_dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(glyph_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list glyphs in {}: {}", glyph_dir.display(), e);
            return Vec::new();
        }
    };
    let mut shapes: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "svg").unwrap_or(false))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    shapes.sort();
    shapes
}

#[derive(Debug, Clone)]
pub struct IconCache {
    cache_dir: PathBuf,
    glyph_dir: PathBuf,
}

impl IconCache {
    pub fn new(cache_dir: impl Into<PathBuf>, glyph_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            glyph_dir: glyph_dir.into(),
        }
    }

    pub fn glyph_dir(&self) -> &Path {
        &self.glyph_dir
    }

    pub fn template_path(&self, shape: &str) -> PathBuf {
        self.glyph_dir.join(format!("{shape}.svg"))
    }

    pub fn icon_path(&self, shape: &str, color: HexColor) -> PathBuf {
        self.cache_dir.join(format!("{shape}_{color}.svg"))
    }

    /// Return the colored icon for `(shape, color)`, creating it if needed.
    pub fn ensure_icon(&self, shape: &str, color: HexColor) -> Result<CachedIcon, CacheCreationError> {
        let path = self.icon_path(shape, color);
        if path.exists() {
            return Ok(CachedIcon { path, created: false });
        }

        let fail = |source| CacheCreationError {
            key: path.clone(),
            source,
        };
        let template = fs::read_to_string(self.template_path(shape)).map_err(fail)?;
        let colored = template.replacen(SENTINEL, &color.to_string(), 1);

        fs::create_dir_all(&self.cache_dir).map_err(fail)?;
        let tmp = self
            .cache_dir
            .join(format!(".{shape}_{color}.{}.tmp", std::process::id()));
        if let Err(e) = fs::write(&tmp, colored) {
            let _ = fs::remove_file(&tmp);
            return Err(fail(e));
        }
        if path.exists() {
            // someone else finished first; theirs is identical
            let _ = fs::remove_file(&tmp);
            return Ok(CachedIcon { path, created: false });
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(fail(e));
        }
        log::debug!("created tracker icon {}", path.display());
        Ok(CachedIcon { path, created: true })
    }

    /// Make sure every color of `colors` has an icon for `shape`.
    pub fn ensure_all(&self, shape: &str, colors: &TrackerColorSet) -> Vec<Result<CachedIcon, CacheCreationError>> {
        colors
            .distinct()
            .into_iter()
            .map(|color| self.ensure_icon(shape, color))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerTimer {
    Update,
    ReleaseDebounce(u8),
    HighlightTimeout,
}

/// What changed during one `poll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerUpdate {
    pub moved: bool,
    pub recolored: bool,
}

impl TrackerUpdate {
    pub fn needs_repaint(&self) -> bool {
        self.moved || self.recolored
    }
}

/// What `apply_settings` had to redo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerChanges {
    pub regenerated: bool,
    /// Icons written to disk during regeneration.
    pub created: usize,
    pub icon_switched: bool,
    pub updater_restarted: bool,
}

pub struct TrackerManager {
    cache: IconCache,
    shape: String,
    colors: TrackerColorSet,
    size: u32,
    opacity: u32,
    interval: Duration,
    enabled: bool,
    /// Top-left corner of the icon.
    position: Option<Point>,
    active_slot: ColorSlot,
    active_button: Option<u8>,
    icon: Option<PathBuf>,
    timers: TimerSet<TrackerTimer>,
    updater: Option<TimerId>,
    debounce: Option<TimerId>,
    highlight_timeout: Option<TimerId>,
}

impl TrackerManager {
    /// Build the tracker (disabled) and fill the icon cache for the
    /// configured shape and colors.
    pub fn new(cache: IconCache, settings: &EyeSettings, notifier: &mut dyn Notifier) -> Self {
        let mut tracker = Self {
            cache,
            shape: settings.tracker_shape.clone(),
            colors: TrackerColorSet::from_settings(settings),
            size: settings.tracker_size,
            opacity: settings.tracker_opacity,
            interval: Duration::from_millis(u64::from(settings.tracker_repaint_interval)),
            enabled: false,
            position: None,
            active_slot: ColorSlot::Default,
            active_button: None,
            icon: None,
            timers: TimerSet::new(),
            updater: None,
            debounce: None,
            highlight_timeout: None,
        };
        tracker.regenerate(notifier);
        tracker.switch_icon(notifier);
        tracker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn opacity(&self) -> u32 {
        self.opacity
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Icon currently displayed.
    pub fn icon_path(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    pub fn active_slot(&self) -> ColorSlot {
        self.active_slot
    }

    /// Color the tracker shows right now, or `None` while hidden.
    pub fn current_color(&self) -> Option<HexColor> {
        self.enabled.then(|| self.colors.get(self.active_slot))
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    pub fn enable(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.position = None;
        self.active_slot = ColorSlot::Default;
        self.active_button = None;
        self.switch_icon(notifier);
        self.updater = Some(self.timers.every(TrackerTimer::Update, self.interval, now));
        log::info!("tracker enabled ({})", self.shape);
    }

    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.timers.clear();
        self.updater = None;
        self.debounce = None;
        self.highlight_timeout = None;
        self.active_button = None;
        self.active_slot = ColorSlot::Default;
        self.position = None;
        log::info!("tracker disabled");
    }

    pub fn toggle(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        if self.enabled {
            self.disable();
        } else {
            self.enable(now, notifier);
        }
    }

    /// A pointer button went down. Returns true if the icon changed.
    pub fn handle_button_press(&mut self, button: u8, now: Instant, notifier: &mut dyn Notifier) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(slot) = ColorSlot::from_button(button) else {
            return false;
        };
        self.timers.stop(&mut self.debounce);
        self.timers.stop(&mut self.highlight_timeout);
        self.highlight_timeout = Some(self.timers.once(TrackerTimer::HighlightTimeout, HIGHLIGHT_TIMEOUT, now));
        self.active_button = Some(button);
        if self.active_slot == slot {
            return false;
        }
        self.active_slot = slot;
        self.switch_icon(notifier);
        true
    }

    /// A pointer button went up. The default color comes back after a
    /// short debounce, unless another press arrives first.
    pub fn handle_button_release(&mut self, button: u8, now: Instant) {
        if !self.enabled || self.active_button != Some(button) {
            return;
        }
        self.timers.stop(&mut self.debounce);
        self.debounce = Some(self.timers.once(TrackerTimer::ReleaseDebounce(button), RELEASE_DEBOUNCE, now));
    }

    /// Advance the tracker timers. `pointer` is the latest pointer
    /// position, if known.
    pub fn poll(&mut self, now: Instant, pointer: Option<Point>, notifier: &mut dyn Notifier) -> TrackerUpdate {
        let mut update = TrackerUpdate::default();
        for (id, timer) in self.timers.poll(now) {
            match timer {
                TrackerTimer::Update => {
                    let Some(p) = pointer else { continue };
                    let half = f64::from(self.size) / 2.0;
                    let next = Point::new(p.x - half, p.y - half);
                    if self.position != Some(next) {
                        self.position = Some(next);
                        update.moved = true;
                    }
                }
                TrackerTimer::ReleaseDebounce(button) => {
                    if self.debounce == Some(id) {
                        self.debounce = None;
                    }
                    if self.active_button == Some(button) {
                        update.recolored |= self.restore_default(notifier);
                    }
                }
                TrackerTimer::HighlightTimeout => {
                    if self.highlight_timeout == Some(id) {
                        self.highlight_timeout = None;
                    }
                    update.recolored |= self.restore_default(notifier);
                }
            }
        }
        update
    }

    fn restore_default(&mut self, notifier: &mut dyn Notifier) -> bool {
        self.timers.stop(&mut self.debounce);
        self.timers.stop(&mut self.highlight_timeout);
        self.active_button = None;
        if self.active_slot == ColorSlot::Default {
            return false;
        }
        self.active_slot = ColorSlot::Default;
        self.switch_icon(notifier);
        true
    }

    /// Take over new tracker settings, redoing only what they affect.
    pub fn apply_settings(&mut self, settings: &EyeSettings, now: Instant, notifier: &mut dyn Notifier) -> TrackerChanges {
        let mut changes = TrackerChanges::default();
        let colors = TrackerColorSet::from_settings(settings);
        let shape_changed = settings.tracker_shape != self.shape;
        let colors_changed = colors != self.colors;
        let default_changed = colors.default != self.colors.default;
        let interval = Duration::from_millis(u64::from(settings.tracker_repaint_interval));

        self.shape = settings.tracker_shape.clone();
        self.colors = colors;
        self.size = settings.tracker_size;
        self.opacity = settings.tracker_opacity;

        if shape_changed || colors_changed {
            changes.regenerated = true;
            changes.created = self.regenerate(notifier);
        }
        if shape_changed || default_changed {
            self.switch_icon(notifier);
            changes.icon_switched = true;
        }
        if interval != self.interval {
            self.interval = interval;
            if self.enabled {
                self.timers.stop(&mut self.updater);
                self.updater = Some(self.timers.every(TrackerTimer::Update, interval, now));
                changes.updater_restarted = true;
            }
        }
        changes
    }

    /// Cancel every timer and hide the tracker. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.disable();
    }

    fn regenerate(&mut self, notifier: &mut dyn Notifier) -> usize {
        let mut created = 0;
        for result in self.cache.ensure_all(&self.shape, &self.colors) {
            match result {
                Ok(icon) => created += usize::from(icon.created),
                Err(e) => notifier.notify("Tracker icon", &e.to_string()),
            }
        }
        created
    }

    /// Point the displayed icon at the active color. On failure the
    /// previous icon stays, or the plain template if there was none.
    fn switch_icon(&mut self, notifier: &mut dyn Notifier) {
        let color = self.colors.get(self.active_slot);
        match self.cache.ensure_icon(&self.shape, color) {
            Ok(icon) => self.icon = Some(icon.path),
            Err(e) => {
                notifier.notify("Tracker icon", &e.to_string());
                if self.icon.is_none() {
                    self.icon = Some(self.cache.template_path(&self.shape));
                }
            }
        }
    }
}

impl Drop for TrackerManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MessageLog;
    use tempfile::TempDir;

    const CIRCLE: &str = r##"<svg><circle fill="#000000" stroke="#000000"/></svg>"##;

    struct Dirs {
        _root: TempDir,
        glyphs: PathBuf,
        cache: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let glyphs = root.path().join("glyphs");
        fs::create_dir(&glyphs).unwrap();
        fs::write(glyphs.join("circle.svg"), CIRCLE).unwrap();
        fs::write(glyphs.join("ring.svg"), CIRCLE).unwrap();
        fs::write(glyphs.join("notes.txt"), "not a glyph").unwrap();
        let cache = root.path().join("cache").join("trackers");
        Dirs {
            _root: root,
            glyphs,
            cache,
        }
    }

    fn red() -> HexColor {
        HexColor::from_rgb(0xff, 0, 0)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn cached_files(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_icon_created_once() {
        let d = dirs();
        let cache = IconCache::new(&d.cache, &d.glyphs);

        let first = cache.ensure_icon("circle", red()).unwrap();
        assert!(first.created);
        assert_eq!(first.path, d.cache.join("circle_#ff0000.svg"));

        let second = cache.ensure_icon("circle", red()).unwrap();
        assert!(!second.created);
        assert_eq!(second.path, first.path);
        assert_eq!(cached_files(&d.cache), 1);
    }

    #[test]
    fn test_only_first_sentinel_is_replaced() {
        let d = dirs();
        let cache = IconCache::new(&d.cache, &d.glyphs);
        let icon = cache.ensure_icon("circle", red()).unwrap();
        let text = fs::read_to_string(icon.path).unwrap();
        assert_eq!(text, r##"<svg><circle fill="#ff0000" stroke="#000000"/></svg>"##);
    }

    #[test]
    fn test_missing_template_is_reported() {
        let d = dirs();
        let cache = IconCache::new(&d.cache, &d.glyphs);
        let err = cache.ensure_icon("star", red()).unwrap_err();
        assert_eq!(err.key, d.cache.join("star_#ff0000.svg"));
        assert!(!err.key.exists());
    }

    #[test]
    fn test_uncreatable_cache_dir() {
        let d = dirs();
        let blocker = d.glyphs.join("circle.svg");
        let cache = IconCache::new(blocker.join("trackers"), &d.glyphs);
        assert!(cache.ensure_icon("circle", red()).is_err());
    }

    #[test]
    fn test_available_shapes_sorted() {
        let d = dirs();
        assert_eq!(available_shapes(&d.glyphs), vec!["circle".to_string(), "ring".to_string()]);
        assert!(available_shapes(&d.glyphs.join("missing")).is_empty());
    }

    #[test]
    fn test_manager_fills_cache_on_start() {
        let d = dirs();
        let mut log = MessageLog::default();
        let tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &EyeSettings::default(), &mut log);

        assert!(log.is_empty());
        assert_eq!(cached_files(&d.cache), 4);
        let default = EyeSettings::default().tracker_color;
        assert_eq!(tracker.icon_path(), Some(d.cache.join(format!("circle_{default}.svg")).as_path()));
        assert_eq!(tracker.current_color(), None);
    }

    #[test]
    fn test_no_spurious_invalidation() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let mut settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);

        assert_eq!(tracker.apply_settings(&settings, t0, &mut log), TrackerChanges::default());

        settings.tracker_opacity = 100;
        settings.tracker_size = 256;
        let changes = tracker.apply_settings(&settings, t0, &mut log);
        assert!(!changes.regenerated && !changes.icon_switched);
        assert_eq!(tracker.opacity(), 100);

        settings.tracker_color_left = HexColor::from_rgb(1, 2, 3);
        let changes = tracker.apply_settings(&settings, t0, &mut log);
        assert!(changes.regenerated);
        assert_eq!(changes.created, 1);
        assert!(!changes.icon_switched);

        settings.tracker_color = HexColor::from_rgb(4, 5, 6);
        let changes = tracker.apply_settings(&settings, t0, &mut log);
        assert!(changes.regenerated && changes.icon_switched);
        assert_eq!(tracker.icon_path(), Some(d.cache.join("circle_#040506.svg").as_path()));
        assert_eq!(cached_files(&d.cache), 6);
    }

    #[test]
    fn test_updater_follows_pointer() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &EyeSettings::default(), &mut log);
        let pointer = Some(Point::new(300.0, 200.0));

        assert!(!tracker.poll(t0 + ms(100), pointer, &mut log).moved);

        tracker.enable(t0, &mut log);
        assert!(!tracker.poll(t0 + ms(10), pointer, &mut log).moved);
        assert!(tracker.poll(t0 + ms(16), pointer, &mut log).moved);
        assert_eq!(tracker.position(), Some(Point::new(236.0, 136.0)));
        // same pointer: nothing to redraw
        assert!(!tracker.poll(t0 + ms(32), pointer, &mut log).needs_repaint());
    }

    #[test]
    fn test_interval_change_restarts_updater_only_when_enabled() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let mut settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);

        settings.tracker_repaint_interval = 100;
        assert!(!tracker.apply_settings(&settings, t0, &mut log).updater_restarted);

        tracker.enable(t0, &mut log);
        settings.tracker_repaint_interval = 40;
        assert!(tracker.apply_settings(&settings, t0, &mut log).updater_restarted);
        assert_eq!(tracker.next_due(), Some(t0 + ms(40)));
    }

    #[test]
    fn test_click_highlight_and_release_debounce() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);
        tracker.enable(t0, &mut log);

        assert!(tracker.handle_button_press(1, t0, &mut log));
        assert_eq!(tracker.current_color(), Some(settings.tracker_color_left));

        tracker.handle_button_release(1, t0 + ms(200));
        assert!(!tracker.poll(t0 + ms(240), None, &mut log).recolored);
        assert!(tracker.poll(t0 + ms(250), None, &mut log).recolored);
        assert_eq!(tracker.current_color(), Some(settings.tracker_color));
    }

    #[test]
    fn test_press_during_debounce_keeps_highlight() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);
        tracker.enable(t0, &mut log);

        tracker.handle_button_press(3, t0, &mut log);
        tracker.handle_button_release(3, t0 + ms(100));
        tracker.handle_button_press(3, t0 + ms(120), &mut log);
        tracker.poll(t0 + ms(300), None, &mut log);
        assert_eq!(tracker.current_color(), Some(settings.tracker_color_right));
    }

    #[test]
    fn test_highlight_times_out_without_release() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);
        tracker.enable(t0, &mut log);

        tracker.handle_button_press(2, t0, &mut log);
        assert!(!tracker.handle_button_press(9, t0, &mut log));
        tracker.poll(t0 + ms(2999), None, &mut log);
        assert_eq!(tracker.current_color(), Some(settings.tracker_color_middle));
        tracker.poll(t0 + ms(3000), None, &mut log);
        assert_eq!(tracker.current_color(), Some(settings.tracker_color));
    }

    #[test]
    fn test_missing_glyph_falls_back_to_template() {
        let d = dirs();
        let mut log = MessageLog::default();
        let mut settings = EyeSettings::default();
        settings.tracker_shape = "star".into();
        let tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);

        assert!(!log.is_empty());
        assert_eq!(tracker.icon_path(), Some(d.glyphs.join("star.svg").as_path()));
    }

    #[test]
    fn test_failed_switch_keeps_previous_icon() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let mut settings = EyeSettings::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &settings, &mut log);
        let before = tracker.icon_path().map(Path::to_path_buf);

        settings.tracker_shape = "star".into();
        tracker.apply_settings(&settings, t0, &mut log);
        assert!(log.latest().is_some());
        assert_eq!(tracker.icon_path().map(Path::to_path_buf), before);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let d = dirs();
        let t0 = Instant::now();
        let mut log = MessageLog::default();
        let mut tracker = TrackerManager::new(IconCache::new(&d.cache, &d.glyphs), &EyeSettings::default(), &mut log);
        tracker.enable(t0, &mut log);
        tracker.handle_button_press(1, t0, &mut log);

        tracker.teardown();
        tracker.teardown();
        assert!(!tracker.is_enabled());
        assert_eq!(tracker.next_due(), None);
        assert!(!tracker.poll(t0 + ms(5000), Some(Point::new(1.0, 1.0)), &mut log).needs_repaint());
    }
}
