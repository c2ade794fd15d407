//! slowEyes application
//!
//! The window stands in for a desktop panel: a strip of eyes across the
//! middle, a menu bar on top and a status bar below. Components live behind
//! `Rc<RefCell<..>>` so settings listeners can reach them.

use egui::{Color32, Context, Id, LayerId, Order, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
use slowcore::repaint::RepaintController;
use slowcore::theme::{consume_zoom_keys, menu_bar, SlowTheme};
use slowcore::widgets::{status_bar, toolbar_separator, SlowButton};
use sloweyes::blink::{BlinkEvent, BlinkScheduler};
use sloweyes::color::HexColor;
use sloweyes::eye::{Eye, EyeConfig, EyeFrame};
use sloweyes::gaze::{EyeShape, Point};
use sloweyes::keybinding::{Action, Keybindings};
use sloweyes::notify::{MessageLog, Notifier};
use sloweyes::raster;
use sloweyes::settings::{BlinkMode, EyeSettings, PanelPosition, SettingKey, SettingValue, SettingsStore};
use sloweyes::tracker::{IconCache, TrackerManager};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

/// Height of the eye strip, like a panel's.
const STRIP_HEIGHT: f64 = 40.0;

const BLINK_KEYS: [SettingKey; 6] = [
    SettingKey::EyeBlinkMode,
    SettingKey::EyeBlinkInterval,
    SettingKey::EyeBlinkIntervalRange,
    SettingKey::EyeCount,
    SettingKey::EyePosition,
    SettingKey::EyeIndex,
];

fn build_eyes(settings: &EyeSettings, now: Instant, notifier: &mut dyn Notifier) -> Vec<Eye> {
    let config = match EyeConfig::from_settings(settings, STRIP_HEIGHT) {
        Ok(config) => config,
        Err(e) => {
            notifier.notify("Eyes", &e.to_string());
            match EyeConfig::from_settings(&EyeSettings::default(), STRIP_HEIGHT) {
                Ok(config) => config,
                Err(_) => return Vec::new(),
            }
        }
    };
    (0..settings.eye_count as usize)
        .map(|index| Eye::new(index, config.clone(), now))
        .collect()
}

fn button_number(button: egui::PointerButton) -> u8 {
    match button {
        egui::PointerButton::Primary => 1,
        egui::PointerButton::Middle => 2,
        egui::PointerButton::Secondary => 3,
        egui::PointerButton::Extra1 => 8,
        egui::PointerButton::Extra2 => 9,
    }
}

fn to_point(pos: Pos2) -> Point {
    Point::new(f64::from(pos.x), f64::from(pos.y))
}

pub struct SlowEyesApp {
    store: SettingsStore,
    eyes: Rc<RefCell<Vec<Eye>>>,
    blink: Rc<RefCell<BlinkScheduler>>,
    tracker: Rc<RefCell<TrackerManager>>,
    keybindings: Rc<RefCell<Keybindings>>,
    messages: Rc<RefCell<MessageLog>>,
    /// Set by listeners when every eye must be redrawn.
    layout_changed: Rc<Cell<bool>>,
    textures: Vec<Option<TextureHandle>>,
    stale: Vec<bool>,
    /// Rendered tracker icon, keyed by icon path and size.
    tracker_texture: Option<(PathBuf, u32, TextureHandle)>,
    last_pointer: Point,
    settings_dirty: bool,
    blink_key_text: String,
    tracker_key_text: String,
    show_settings: bool,
    show_about: bool,
    repaint: RepaintController,
}

impl SlowEyesApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, store: SettingsStore, cache: IconCache) -> Self {
        let now = Instant::now();
        let settings = store.snapshot();
        let mut messages = MessageLog::default();

        let eyes = build_eyes(&settings, now, &mut messages);
        let blink = BlinkScheduler::new(&settings, now);
        let tracker = TrackerManager::new(cache, &settings, &mut messages);
        let mut keybindings = Keybindings::default();
        for (action, accel) in [
            (Action::Blink, &settings.eye_blink_keybinding),
            (Action::ToggleTracker, &settings.tracker_keybinding),
        ] {
            if let Err(e) = keybindings.bind(action, accel) {
                messages.notify("Keybinding", &format!("{}: {e}", action.name()));
            }
        }

        let mut app = Self {
            store,
            eyes: Rc::new(RefCell::new(eyes)),
            blink: Rc::new(RefCell::new(blink)),
            tracker: Rc::new(RefCell::new(tracker)),
            keybindings: Rc::new(RefCell::new(keybindings)),
            messages: Rc::new(RefCell::new(messages)),
            layout_changed: Rc::new(Cell::new(true)),
            textures: Vec::new(),
            stale: Vec::new(),
            tracker_texture: None,
            last_pointer: Point::default(),
            settings_dirty: false,
            blink_key_text: settings.eye_blink_keybinding.clone(),
            tracker_key_text: settings.tracker_keybinding.clone(),
            show_settings: false,
            show_about: false,
            repaint: RepaintController::new(),
        };
        app.subscribe();
        app
    }

    /// Route setting changes to the components that care.
    fn subscribe(&mut self) {
        let eyes = Rc::clone(&self.eyes);
        let messages = Rc::clone(&self.messages);
        let layout_changed = Rc::clone(&self.layout_changed);
        let mut eye_keys = SettingKey::PLACEMENT.to_vec();
        eye_keys.extend(SettingKey::EYE_DRAWING);
        self.store.subscribe(
            &eye_keys,
            Box::new(move |key: SettingKey, settings: &Rc<EyeSettings>| {
                let now = Instant::now();
                let mut eyes = eyes.borrow_mut();
                match EyeConfig::from_settings(settings, STRIP_HEIGHT) {
                    Ok(config) => {
                        let count = settings.eye_count as usize;
                        if key == SettingKey::EyeCount {
                            eyes.truncate(count);
                        }
                        for eye in eyes.iter_mut() {
                            eye.update_config(config.clone(), now);
                        }
                        while eyes.len() < count {
                            let index = eyes.len();
                            eyes.push(Eye::new(index, config.clone(), now));
                        }
                    }
                    Err(e) => messages.borrow_mut().notify("Eyes", &e.to_string()),
                }
                layout_changed.set(true);
            }),
        );

        let blink = Rc::clone(&self.blink);
        self.store.subscribe(
            &BLINK_KEYS,
            Box::new(move |key: SettingKey, settings: &Rc<EyeSettings>| {
                blink.borrow_mut().on_settings_changed(key, settings, Instant::now());
            }),
        );

        let tracker = Rc::clone(&self.tracker);
        let messages = Rc::clone(&self.messages);
        self.store.subscribe(
            &SettingKey::TRACKER,
            Box::new(move |_: SettingKey, settings: &Rc<EyeSettings>| {
                let changes = tracker
                    .borrow_mut()
                    .apply_settings(settings, Instant::now(), &mut *messages.borrow_mut());
                log::debug!("tracker settings applied: {:?}", changes);
            }),
        );

        let keybindings = Rc::clone(&self.keybindings);
        let messages = Rc::clone(&self.messages);
        self.store.subscribe(
            &[SettingKey::EyeBlinkKeybinding, SettingKey::TrackerKeybinding],
            Box::new(move |key: SettingKey, settings: &Rc<EyeSettings>| {
                let (action, accel) = match key {
                    SettingKey::EyeBlinkKeybinding => (Action::Blink, &settings.eye_blink_keybinding),
                    _ => (Action::ToggleTracker, &settings.tracker_keybinding),
                };
                if let Err(e) = keybindings.borrow_mut().bind(action, accel) {
                    messages
                        .borrow_mut()
                        .notify("Keybinding", &format!("{}: {e}", action.name()));
                }
            }),
        );
        log::debug!("{} settings listener(s)", self.store.subscription_count());
    }

    /// Validate and store one setting; rejected values are reported.
    fn apply(&mut self, key: SettingKey, value: SettingValue) {
        match self.store.set(key, value) {
            Ok(true) => self.settings_dirty = true,
            Ok(false) => {}
            Err(e) => self.messages.borrow_mut().notify("Settings", &e.to_string()),
        }
    }

    fn reset_settings(&mut self) {
        let changed = self.store.replace(EyeSettings::default());
        if !changed.is_empty() {
            self.settings_dirty = true;
        }
        let settings = self.store.snapshot();
        self.blink_key_text = settings.eye_blink_keybinding.clone();
        self.tracker_key_text = settings.tracker_keybinding.clone();
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.store.save() {
            self.messages.borrow_mut().notify("Settings", &format!("cannot save: {e}"));
        }
        self.settings_dirty = false;
    }

    fn blink_all(&mut self, now: Instant) {
        for eye in self.eyes.borrow_mut().iter_mut() {
            eye.blink(now);
        }
        self.stale.iter_mut().for_each(|s| *s = true);
    }

    fn apply_blink(&mut self, event: BlinkEvent, now: Instant) {
        match event {
            BlinkEvent::All => self.blink_all(now),
            BlinkEvent::Eye(index) => {
                if let Some(eye) = self.eyes.borrow_mut().get_mut(index) {
                    eye.blink(now);
                }
                if let Some(stale) = self.stale.get_mut(index) {
                    *stale = true;
                }
            }
        }
    }

    fn toggle_tracker(&mut self, now: Instant) {
        self.tracker.borrow_mut().toggle(now, &mut *self.messages.borrow_mut());
        self.stale.iter_mut().for_each(|s| *s = true);
        self.repaint.mark_needs_repaint();
    }

    fn handle_keys(&mut self, ctx: &Context, now: Instant) {
        let actions = self.keybindings.borrow().triggered(ctx);
        for action in actions {
            match action {
                Action::Blink => {
                    let event = self.blink.borrow().trigger_manual();
                    if let Some(event) = event {
                        self.apply_blink(event, now);
                    }
                }
                Action::ToggleTracker => self.toggle_tracker(now),
            }
        }
    }

    fn handle_pointer_buttons(&mut self, ctx: &Context, now: Instant) {
        let buttons: Vec<(u8, bool)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::PointerButton { button, pressed, .. } => Some((button_number(*button), *pressed)),
                    _ => None,
                })
                .collect()
        });
        let mut tracker = self.tracker.borrow_mut();
        let mut messages = self.messages.borrow_mut();
        for (button, pressed) in buttons {
            if pressed {
                tracker.handle_button_press(button, now, &mut *messages);
            } else {
                tracker.handle_button_release(button, now);
            }
        }
    }

    /// Advance every timer. Marks eyes whose picture changed.
    fn run_timers(&mut self, now: Instant, pointer: Option<Point>) {
        let tracker_update = {
            let mut messages = self.messages.borrow_mut();
            self.tracker.borrow_mut().poll(now, pointer, &mut *messages)
        };
        if tracker_update.recolored {
            self.stale.iter_mut().for_each(|s| *s = true);
        }

        let events = self.blink.borrow_mut().poll(now);
        for event in events {
            self.apply_blink(event, now);
        }

        let tracker_color = self.tracker.borrow().current_color();
        let mut eyes = self.eyes.borrow_mut();
        for (eye, stale) in eyes.iter_mut().zip(self.stale.iter_mut()) {
            if eye.tick(now, pointer, tracker_color) {
                *stale = true;
            }
        }
    }

    fn schedule_wake(&mut self) {
        self.repaint.wake_at_opt(self.tracker.borrow().next_due());
        self.repaint.wake_at_opt(self.blink.borrow().next_due());
        for eye in self.eyes.borrow().iter() {
            self.repaint.wake_at_opt(eye.next_due());
        }
    }

    /// Screen rectangles of the eyes, laid out like panel slots.
    fn eye_rects(&self, area: Rect) -> Vec<Rect> {
        let settings = self.store.snapshot();
        let width = settings.eye_width as f32;
        let height = STRIP_HEIGHT as f32;
        let slots = (settings.eye_index + settings.eye_count) as f32;
        let left = match settings.eye_position {
            PanelPosition::Left => area.left(),
            PanelPosition::Center => area.center().x - slots * width / 2.0,
            PanelPosition::Right => area.right() - slots * width,
        };
        let top = area.center().y - height / 2.0;
        let count = self.eyes.borrow().len();
        (0..count)
            .map(|i| {
                let x = left + (settings.eye_index as usize + i) as f32 * width;
                Rect::from_min_size(Pos2::new(x, top), Vec2::new(width, height))
            })
            .collect()
    }

    /// Keep one texture slot per eye; redraw everything after a layout change.
    fn sync_slots(&mut self) {
        let count = self.eyes.borrow().len();
        if self.layout_changed.replace(false) || self.stale.len() != count {
            self.stale = vec![true; count];
            self.textures.resize_with(count, || None);
        }
    }

    fn draw_eyes(&mut self, ui: &mut egui::Ui) {
        self.sync_slots();
        let area = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(area, Sense::click());
        let rects = self.eye_rects(area);
        let settings = self.store.snapshot();

        let clicked_eye = response
            .interact_pointer_pos()
            .filter(|_| response.clicked())
            .is_some_and(|pos| rects.iter().any(|r| r.contains(pos)));
        if clicked_eye && settings.eye_reactive {
            self.toggle_tracker(Instant::now());
        }

        let tracker_color = self.tracker.borrow().current_color();
        let foreground = HexColor::from_color32(SlowTheme::ink(ui.ctx()));
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        let eyes = self.eyes.borrow();

        for (index, (eye, rect)) in eyes.iter().zip(rects.iter()).enumerate() {
            if self.stale[index] || self.textures[index].is_none() {
                let frame = EyeFrame {
                    origin: to_point(rect.min),
                    width: f64::from(rect.width()),
                    height: f64::from(rect.height()),
                    pointer: self.last_pointer,
                    foreground,
                    tracker_color,
                };
                let list = eye.render(&frame);
                if let Some(pixmap) = raster::rasterize(&list) {
                    let image = raster::to_color_image(&pixmap);
                    match &mut self.textures[index] {
                        Some(texture) => texture.set(image, TextureOptions::LINEAR),
                        slot => {
                            *slot = Some(ui.ctx().load_texture(format!("eye-{index}"), image, TextureOptions::LINEAR));
                        }
                    }
                }
                self.stale[index] = false;
            }
            if let Some(texture) = &self.textures[index] {
                ui.painter().image(texture.id(), *rect, uv, Color32::WHITE);
            }
        }
    }

    /// Draw the tracker icon centered on the pointer, above everything.
    fn draw_tracker(&mut self, ctx: &Context) {
        let tracker = self.tracker.borrow();
        let (Some(color), Some(position)) = (tracker.current_color(), tracker.position()) else {
            return;
        };
        let size = tracker.size();
        let opacity = tracker.opacity() as f32 / 100.0;
        let rect = Rect::from_min_size(
            Pos2::new(position.x as f32, position.y as f32),
            Vec2::splat(size as f32),
        );
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("tracker")));

        let icon = tracker.icon_path().map(PathBuf::from);
        let cached = matches!(&self.tracker_texture, Some((path, s, _)) if Some(path) == icon.as_ref() && *s == size);
        if !cached {
            self.tracker_texture = icon.and_then(|path| {
                let image = raster::render_svg(&path, size)?;
                let texture = ctx.load_texture("tracker", image, TextureOptions::LINEAR);
                Some((path, size, texture))
            });
        }

        match &self.tracker_texture {
            Some((_, _, texture)) => {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture.id(), rect, uv, Color32::WHITE.gamma_multiply(opacity));
            }
            None => {
                // icon unreadable: a plain disc in the tracker color
                let [r, g, b] = color.rgb();
                let fill = Color32::from_rgb(r, g, b).gamma_multiply(opacity);
                painter.circle_filled(rect.center(), size as f32 / 2.0, fill);
            }
        }
    }

    fn status_text(&self) -> String {
        let settings = self.store.snapshot();
        let tracker = self.tracker.borrow();
        let tracker_state = if tracker.is_enabled() {
            let icon = tracker
                .icon_path()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            format!("tracker on ({icon})")
        } else {
            "tracker off".to_string()
        };
        let mut text = format!(
            "{} eye(s)  |  blink: {}  |  {}",
            self.eyes.borrow().len(),
            settings.eye_blink_mode.name(),
            tracker_state
        );
        if let Some(message) = self.messages.borrow().latest() {
            text.push_str("  |  ");
            text.push_str(message);
        }
        text
    }

    fn render_menu_bar(&mut self, ui: &mut egui::Ui) {
        menu_bar(ui, |ui| {
            ui.menu_button("eyes", |ui| {
                if ui.button("blink now").clicked() {
                    self.blink_all(Instant::now());
                    ui.close_menu();
                }
                if ui.button("toggle tracker").clicked() {
                    self.toggle_tracker(Instant::now());
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("settings...").clicked() {
                    self.show_settings = true;
                    ui.close_menu();
                }
                if ui.button("reset to defaults").clicked() {
                    self.reset_settings();
                    ui.close_menu();
                }
            });
            ui.menu_button("help", |ui| {
                if ui.button("about").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });
        });
    }

    fn placement_ui(&mut self, ui: &mut egui::Ui, s: &EyeSettings, changes: &mut Vec<(SettingKey, SettingValue)>) {
        ui.label("placement");
        ui.horizontal(|ui| {
            for position in PanelPosition::ALL {
                if ui.add(SlowButton::new(position.name()).selected(s.eye_position == position)).clicked() {
                    changes.push((SettingKey::EyePosition, position.name().into()));
                }
            }
        });
        let mut index = s.eye_index;
        if ui.add(egui::DragValue::new(&mut index).clamp_range(0..=100).prefix("index ")).changed() {
            changes.push((SettingKey::EyeIndex, i64::from(index).into()));
        }
        let mut count = s.eye_count;
        if ui.add(egui::DragValue::new(&mut count).clamp_range(1..=100).prefix("count ")).changed() {
            changes.push((SettingKey::EyeCount, i64::from(count).into()));
        }
        let mut reactive = s.eye_reactive;
        if ui.checkbox(&mut reactive, "click an eye to toggle the tracker").changed() {
            changes.push((SettingKey::EyeReactive, reactive.into()));
        }
    }

    fn drawing_ui(&mut self, ui: &mut egui::Ui, s: &EyeSettings, changes: &mut Vec<(SettingKey, SettingValue)>) {
        ui.label("drawing");
        ui.horizontal(|ui| {
            for shape in EyeShape::ALL {
                if ui.add(SlowButton::new(shape.name()).selected(s.eye_shape == shape)).clicked() {
                    changes.push((SettingKey::EyeShape, shape.name().into()));
                }
            }
        });
        let mut line_mode = s.eye_line_mode;
        if ui.checkbox(&mut line_mode, "outline only").changed() {
            changes.push((SettingKey::EyeLineMode, line_mode.into()));
        }
        let mut line_width = s.eye_line_width;
        if ui.add(egui::Slider::new(&mut line_width, 0..=50).text("line width (1/10 px)")).changed() {
            changes.push((SettingKey::EyeLineWidth, i64::from(line_width).into()));
        }
        let mut width = s.eye_width;
        if ui.add(egui::Slider::new(&mut width, 20..=1000).text("width")).changed() {
            changes.push((SettingKey::EyeWidth, i64::from(width).into()));
        }
        let mut interval = s.eye_repaint_interval;
        if ui.add(egui::Slider::new(&mut interval, 5..=1000).text("refresh (ms)")).changed() {
            changes.push((SettingKey::EyeRepaintInterval, i64::from(interval).into()));
        }
        ui.horizontal(|ui| {
            let mut iris_enabled = s.eye_color_iris_enabled;
            if ui.checkbox(&mut iris_enabled, "iris color").changed() {
                changes.push((SettingKey::EyeColorIrisEnabled, iris_enabled.into()));
            }
            color_button(ui, SettingKey::EyeColorIris, s.eye_color_iris, changes);
            ui.label("eyelid");
            color_button(ui, SettingKey::EyeColorEyelid, s.eye_color_eyelid, changes);
        });
    }

    fn blink_ui(&mut self, ui: &mut egui::Ui, s: &EyeSettings, changes: &mut Vec<(SettingKey, SettingValue)>) {
        ui.label("blinking");
        ui.horizontal(|ui| {
            for mode in BlinkMode::ALL {
                if ui.add(SlowButton::new(mode.name()).selected(s.eye_blink_mode == mode)).clicked() {
                    changes.push((SettingKey::EyeBlinkMode, mode.name().into()));
                }
            }
        });
        let mut interval = s.eye_blink_interval;
        if ui.add(egui::Slider::new(&mut interval, 0.5..=60.0).text("interval (s)")).changed() {
            changes.push((SettingKey::EyeBlinkInterval, interval.into()));
        }
        let range = s.eye_blink_interval_range;
        let (mut min, mut max) = (range.min(), range.max());
        let min_changed = ui.add(egui::Slider::new(&mut min, 0.5..=59.9).text("random from (s)")).changed();
        let max_changed = ui.add(egui::Slider::new(&mut max, 0.6..=60.0).text("random to (s)")).changed();
        if min_changed || max_changed {
            changes.push((SettingKey::EyeBlinkIntervalRange, SettingValue::Range(min, max)));
        }
        ui.horizontal(|ui| {
            ui.label("blink key");
            let response = ui.text_edit_singleline(&mut self.blink_key_text);
            if response.lost_focus() {
                changes.push((SettingKey::EyeBlinkKeybinding, self.blink_key_text.as_str().into()));
            }
        });
    }

    fn tracker_ui(&mut self, ui: &mut egui::Ui, s: &EyeSettings, changes: &mut Vec<(SettingKey, SettingValue)>) {
        ui.label("tracker");
        egui::ComboBox::from_label("shape")
            .selected_text(s.tracker_shape.as_str())
            .show_ui(ui, |ui| {
                for shape in self.store.known_shapes() {
                    if ui.selectable_label(*shape == s.tracker_shape, shape.as_str()).clicked() {
                        changes.push((SettingKey::TrackerShape, shape.as_str().into()));
                    }
                }
            });
        let mut size = s.tracker_size;
        if ui.add(egui::Slider::new(&mut size, 128..=1024).text("size")).changed() {
            changes.push((SettingKey::TrackerSize, i64::from(size).into()));
        }
        let mut opacity = s.tracker_opacity;
        if ui.add(egui::Slider::new(&mut opacity, 0..=100).text("opacity (%)")).changed() {
            changes.push((SettingKey::TrackerOpacity, i64::from(opacity).into()));
        }
        let mut interval = s.tracker_repaint_interval;
        if ui.add(egui::Slider::new(&mut interval, 5..=1000).text("refresh (ms)")).changed() {
            changes.push((SettingKey::TrackerRepaintInterval, i64::from(interval).into()));
        }
        ui.horizontal(|ui| {
            for (label, key, color) in [
                ("color", SettingKey::TrackerColor, s.tracker_color),
                ("left", SettingKey::TrackerColorLeft, s.tracker_color_left),
                ("middle", SettingKey::TrackerColorMiddle, s.tracker_color_middle),
                ("right", SettingKey::TrackerColorRight, s.tracker_color_right),
            ] {
                ui.label(label);
                color_button(ui, key, color, changes);
            }
        });
        ui.horizontal(|ui| {
            ui.label("tracker key");
            let response = ui.text_edit_singleline(&mut self.tracker_key_text);
            if response.lost_focus() {
                changes.push((SettingKey::TrackerKeybinding, self.tracker_key_text.as_str().into()));
            }
        });
    }

    fn draw_settings(&mut self, ctx: &Context) {
        if !self.show_settings {
            return;
        }
        let settings = self.store.snapshot();
        let mut changes = Vec::new();
        let mut open = true;
        egui::Window::new("eye settings")
            .collapsible(false)
            .resizable(false)
            .default_width(320.0)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(420.0).show(ui, |ui| {
                    self.placement_ui(ui, &settings, &mut changes);
                    ui.separator();
                    self.drawing_ui(ui, &settings, &mut changes);
                    ui.separator();
                    self.blink_ui(ui, &settings, &mut changes);
                    ui.separator();
                    self.tracker_ui(ui, &settings, &mut changes);
                });
            });
        self.show_settings = open;
        for (key, value) in changes {
            self.apply(key, value);
        }
    }

    fn draw_about(&mut self, ctx: &Context) {
        if !self.show_about {
            return;
        }
        egui::Window::new("about slowEyes")
            .collapsible(false)
            .resizable(false)
            .default_width(260.0)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("slowEyes");
                    ui.label("version 0.2.2");
                    ui.add_space(4.0);
                    ui.label("eyes that follow the pointer");
                });
                ui.separator();
                ui.label("shapes: round, eyelid, comic");
                ui.label("blink: manual, synced, unsynced");
                ui.label("tracker: highlights the pointer,");
                ui.label("  recolored while a button is held");
                ui.vertical_centered(|ui| {
                    if ui.button("ok").clicked() {
                        self.show_about = false;
                    }
                });
            });
    }

    /// Stop every timer and drop every listener.
    fn teardown(&mut self) {
        let listeners = self.store.unsubscribe_all();
        log::debug!("dropped {} settings listener(s)", listeners);
        self.blink.borrow_mut().teardown();
        self.tracker.borrow_mut().teardown();
        for eye in self.eyes.borrow_mut().iter_mut() {
            eye.dispose();
        }
        self.keybindings.borrow_mut().clear();
    }
}

fn color_button(ui: &mut egui::Ui, key: SettingKey, color: HexColor, changes: &mut Vec<(SettingKey, SettingValue)>) {
    let mut rgb = color.rgb();
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        let [r, g, b] = rgb;
        changes.push((key, SettingValue::Str(HexColor::from_rgb(r, g, b).to_string())));
    }
}

impl eframe::App for SlowEyesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.repaint.begin_frame();
        consume_zoom_keys(ctx);

        let pointer = ctx.input(|i| i.pointer.latest_pos()).map(to_point);
        if let Some(p) = pointer {
            self.last_pointer = p;
        }

        self.handle_keys(ctx, now);
        self.handle_pointer_buttons(ctx, now);

        self.sync_slots();
        self.run_timers(now, pointer);

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            self.render_menu_bar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let status = self.status_text();
                status_bar(ui, &status);
                toolbar_separator(ui);
                let enabled = self.tracker.borrow().is_enabled();
                if ui.add(SlowButton::new("tracker").selected(enabled)).clicked() {
                    self.toggle_tracker(Instant::now());
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(SlowTheme::paper(ctx)))
            .show(ctx, |ui| {
                self.draw_eyes(ui);
            });

        self.draw_tracker(ctx);
        self.draw_settings(ctx);
        self.draw_about(ctx);

        if self.settings_dirty && !ctx.input(|i| i.pointer.any_down()) {
            self.save_settings();
        }

        // settings changed after the eyes were drawn
        if self.layout_changed.get() {
            self.repaint.mark_needs_repaint();
        }
        self.schedule_wake();
        self.repaint.end_frame(ctx);
    }
}

impl Drop for SlowEyesApp {
    fn drop(&mut self) {
        self.teardown();
        if self.settings_dirty {
            self.save_settings();
        }
    }
}
