//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    Pick,
    NewBoard,
    Quit,
    None,
}

/// Map key event to an action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Pick,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::NewBoard,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Action {
        key_to_action(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        let none = KeyModifiers::NONE;
        assert_eq!(press(KeyCode::Left, none), press(KeyCode::Char('h'), none));
        assert_eq!(press(KeyCode::Down, none), Action::CursorDown);
        assert_eq!(press(KeyCode::Char('k'), none), Action::CursorUp);
        assert_eq!(press(KeyCode::Char(' '), none), Action::Pick);
        assert_eq!(press(KeyCode::Enter, none), Action::Pick);
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(press(KeyCode::Char('h'), KeyModifiers::ALT), Action::None);
        assert_eq!(press(KeyCode::Char('R'), KeyModifiers::SHIFT), Action::NewBoard);
    }
}
