//! Keyboard shortcut resolution.
//!
//! Presentation feeds raw key events in; what comes out is the editor
//! command to run, if any. Every shortcut is suppressed while focus
//! sits in a text input so typing never triggers editor actions.

/// Editor-level commands bound to keyboard shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorCommand {
    /// Ctrl/Cmd+S: install the current graph on the backend.
    Save,
    /// Ctrl/Cmd+Z.
    Undo,
    /// Ctrl/Cmd+Shift+Z or Ctrl/Cmd+Y.
    Redo,
    /// Delete: cascade-remove the selected elements.
    DeleteSelection,
    /// Escape: clear the search highlight.
    ClearSearch,
}

/// A raw key event as the windowing layer reports it.
#[derive(Clone, Debug, Default)]
pub struct KeyEvent {
    /// Key name, case-insensitive for letters (`"s"`, `"Delete"`,
    /// `"Escape"`).
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// Focus is inside an input, textarea, or editable element.
    pub in_text_input: bool,
}

impl KeyEvent {
    fn ctrl_or_meta(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Map a key event to its editor command, or `None` when the event is
/// not a shortcut.
#[must_use]
pub fn resolve_shortcut(event: &KeyEvent) -> Option<EditorCommand> {
    if event.in_text_input {
        return None;
    }

    match event.key.as_str() {
        "Delete" => return Some(EditorCommand::DeleteSelection),
        "Escape" => return Some(EditorCommand::ClearSearch),
        _ => {}
    }

    if !event.ctrl_or_meta() {
        return None;
    }
    match event.key.to_ascii_lowercase().as_str() {
        "s" => Some(EditorCommand::Save),
        "z" if event.shift => Some(EditorCommand::Redo),
        "z" => Some(EditorCommand::Undo),
        "y" => Some(EditorCommand::Redo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(key: &str) -> KeyEvent {
        KeyEvent {
            key: key.to_string(),
            ctrl: true,
            ..KeyEvent::default()
        }
    }

    #[test]
    fn resolves_primary_shortcuts() {
        assert_eq!(resolve_shortcut(&ctrl("s")), Some(EditorCommand::Save));
        assert_eq!(resolve_shortcut(&ctrl("z")), Some(EditorCommand::Undo));
        assert_eq!(resolve_shortcut(&ctrl("y")), Some(EditorCommand::Redo));
        assert_eq!(
            resolve_shortcut(&KeyEvent {
                shift: true,
                ..ctrl("Z")
            }),
            Some(EditorCommand::Redo)
        );
    }

    #[test]
    fn meta_works_like_ctrl() {
        let event = KeyEvent {
            key: "s".to_string(),
            meta: true,
            ..KeyEvent::default()
        };
        assert_eq!(resolve_shortcut(&event), Some(EditorCommand::Save));
    }

    #[test]
    fn bare_keys_without_modifier() {
        assert_eq!(
            resolve_shortcut(&KeyEvent {
                key: "Delete".to_string(),
                ..KeyEvent::default()
            }),
            Some(EditorCommand::DeleteSelection)
        );
        assert_eq!(
            resolve_shortcut(&KeyEvent {
                key: "Escape".to_string(),
                ..KeyEvent::default()
            }),
            Some(EditorCommand::ClearSearch)
        );
        assert_eq!(
            resolve_shortcut(&KeyEvent {
                key: "z".to_string(),
                ..KeyEvent::default()
            }),
            None
        );
    }

    #[test]
    fn suppressed_inside_text_inputs() {
        let mut event = ctrl("s");
        event.in_text_input = true;
        assert_eq!(resolve_shortcut(&event), None);
        assert_eq!(
            resolve_shortcut(&KeyEvent {
                key: "Delete".to_string(),
                in_text_input: true,
                ..KeyEvent::default()
            }),
            None
        );
    }
}
