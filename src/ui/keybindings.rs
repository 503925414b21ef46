// src/ui/keybindings.rs
//! Keyboard input handling and key mappings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::scene::SceneKind;

/// Map digit keys to a visual mode.
pub fn map_key_to_mode(k: &KeyEvent) -> Option<SceneKind> {
    if let KeyCode::Char(c) = k.code {
        match c {
            '1' => Some(SceneKind::Particles),
            '2' => Some(SceneKind::Geometric),
            '3' => Some(SceneKind::Dream3d),
            _ => None,
        }
    } else {
        None
    }
}

/// Actions derived from key events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Up,
    Down,
    /// Load the highlighted track and play it.
    Enter,
    TogglePlayback,
    ToggleMicrophone,
    VolumeUp,
    VolumeDown,
    SetMode(SceneKind),
    NextMode,
    NextTheme,
    ToggleControls,
    Quit,
    None,
}

/// Convert a key event to an action.
pub fn key_to_action(key: &KeyEvent) -> Action {
    // Releases arrive on some platforms; only presses act
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }
    if let Some(mode) = map_key_to_mode(key) {
        return Action::SetMode(mode);
    }

    match key.code {
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Enter => Action::Enter,
        KeyCode::Char(' ') => Action::TogglePlayback,
        KeyCode::Char('m') => Action::ToggleMicrophone,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,
        KeyCode::Char('v') => Action::NextMode,
        KeyCode::Char('t') => Action::NextTheme,
        KeyCode::Char('c') => Action::ToggleControls,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}
