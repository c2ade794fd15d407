//! GTK-style accelerators (`<Super>b`, `<Control><Alt>t`) mapped to egui

use crate::error::{ConfigResult, ConfigValidationError};
use egui::{Key, Modifiers};

/// Named actions that can be bound to an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Blink every eye (manual blink mode only).
    Blink,
    ToggleTracker,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Blink => "eye-blink-keybinding",
            Action::ToggleTracker => "tracker-keybinding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accelerator {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Accelerator {
    /// Parse an accelerator string. An empty string means "unbound".
    pub fn parse(text: &str) -> ConfigResult<Option<Self>> {
        let invalid = || ConfigValidationError::InvalidAccelerator(text.to_string());
        let mut rest = text.trim();
        if rest.is_empty() {
            return Ok(None);
        }

        let mut modifiers = Modifiers::NONE;
        while let Some(stripped) = rest.strip_prefix('<') {
            let (name, tail) = stripped.split_once('>').ok_or_else(invalid)?;
            match name.to_ascii_lowercase().as_str() {
                "control" | "ctrl" | "primary" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "super" | "meta" => {
                    modifiers.mac_cmd = true;
                    modifiers.command = true;
                }
                _ => return Err(invalid()),
            }
            rest = tail;
        }
        if modifiers.ctrl && !modifiers.mac_cmd {
            modifiers.command = true;
        }

        let key = Key::from_name(rest)
            .or_else(|| Key::from_name(&rest.to_ascii_uppercase()))
            .ok_or_else(invalid)?;
        Ok(Some(Self { modifiers, key }))
    }

    /// Whether this accelerator was pressed this frame. The key press is
    /// consumed so no widget sees it.
    pub fn pressed(&self, ctx: &egui::Context) -> bool {
        ctx.input_mut(|i| i.consume_key(self.modifiers, self.key))
    }
}

/// Accelerators currently bound, rebuilt whenever a binding setting changes.
#[derive(Debug, Default, Clone)]
pub struct Keybindings {
    bindings: Vec<(Action, Accelerator)>,
}

impl Keybindings {
    /// Bind `action`, replacing any previous binding. An empty accelerator
    /// unbinds it.
    pub fn bind(&mut self, action: Action, accelerator: &str) -> ConfigResult<()> {
        let parsed = Accelerator::parse(accelerator)?;
        self.bindings.retain(|(a, _)| *a != action);
        if let Some(acc) = parsed {
            self.bindings.push((action, acc));
        }
        Ok(())
    }

    pub fn get(&self, action: Action) -> Option<Accelerator> {
        self.bindings.iter().find(|(a, _)| *a == action).map(|(_, acc)| *acc)
    }

    /// Actions whose accelerator fired this frame.
    pub fn triggered(&self, ctx: &egui::Context) -> Vec<Action> {
        self.bindings
            .iter()
            .filter(|(_, acc)| acc.pressed(ctx))
            .map(|(action, _)| *action)
            .collect()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
