//! slowEyes: eyes that follow the pointer, for slowOS
//!
//! Glyph templates for the tracker are read from `SLOWEYES_GLYPHS` if set,
//! else from a `glyphs/` directory next to the executable.

mod app;

use app::SlowEyesApp;
use eframe::NativeOptions;
use slowcore::storage;
use sloweyes::settings::SettingsStore;
use sloweyes::tracker::{available_shapes, IconCache};
use std::path::PathBuf;

fn glyph_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SLOWEYES_GLYPHS") {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("glyphs")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("glyphs"))
}

fn main() -> eframe::Result<()> {
    slowcore::logging::init_logger();

    let glyphs = glyph_dir();
    let shapes = available_shapes(&glyphs);
    log::info!("{} tracker glyph(s) in {}", shapes.len(), glyphs.display());

    let settings_path = SettingsStore::default_path();
    let store = SettingsStore::load(&settings_path, shapes);
    let cache = IconCache::new(storage::cache_dir("sloweyes").join("trackers"), glyphs);

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([480.0, 160.0])
        .with_title("slowEyes");

    if let Some(pos) = slowcore::cascade_position() {
        viewport = viewport.with_position(pos);
    }

    let options = NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "slowEyes",
        options,
        Box::new(|cc| {
            slowcore::SlowTheme::default().apply(&cc.egui_ctx);
            Box::new(SlowEyesApp::new(cc, store, cache))
        }),
    )
}
