//! Key model: normalized key names and events

use crossterm::event::KeyCode;

/// Normalized key name delivered to subscribers.
///
/// This is the only key vocabulary callers may rely on: the named keys below,
/// plus `Char` for any literal character and `Unknown` for everything the
/// terminal sends that we cannot identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    /// Literal character fallback for unrecognized printable input
    Char(char),
    /// Nothing identifiable at all
    Unknown,
}

/// One logical (post-debounce) keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The raw character, when the terminal delivered one
    pub raw: Option<char>,
    pub name: KeyName,
    pub ctrl: bool,
}

/// Map a raw key code to its normalized name. Total and pure: every input
/// yields a name, never an error.
pub fn normalize_key(code: KeyCode) -> KeyName {
    match code {
        KeyCode::Up => KeyName::Up,
        KeyCode::Down => KeyName::Down,
        KeyCode::Left => KeyName::Left,
        KeyCode::Right => KeyName::Right,
        KeyCode::Enter => KeyName::Enter,
        KeyCode::Esc => KeyName::Escape,
        KeyCode::Char(' ') => KeyName::Space,
        KeyCode::Tab => KeyName::Tab,
        KeyCode::Backspace => KeyName::Backspace,
        KeyCode::Char(c) => KeyName::Char(c),
        _ => KeyName::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map_to_their_names() {
        assert_eq!(normalize_key(KeyCode::Up), KeyName::Up);
        assert_eq!(normalize_key(KeyCode::Down), KeyName::Down);
        assert_eq!(normalize_key(KeyCode::Left), KeyName::Left);
        assert_eq!(normalize_key(KeyCode::Right), KeyName::Right);
        assert_eq!(normalize_key(KeyCode::Enter), KeyName::Enter);
        assert_eq!(normalize_key(KeyCode::Esc), KeyName::Escape);
        assert_eq!(normalize_key(KeyCode::Char(' ')), KeyName::Space);
        assert_eq!(normalize_key(KeyCode::Tab), KeyName::Tab);
        assert_eq!(normalize_key(KeyCode::Backspace), KeyName::Backspace);
    }

    #[test]
    fn test_printable_characters_pass_through() {
        assert_eq!(normalize_key(KeyCode::Char('a')), KeyName::Char('a'));
        assert_eq!(normalize_key(KeyCode::Char('Z')), KeyName::Char('Z'));
        assert_eq!(normalize_key(KeyCode::Char('7')), KeyName::Char('7'));
    }

    #[test]
    fn test_unrecognized_keys_become_unknown() {
        assert_eq!(normalize_key(KeyCode::Home), KeyName::Unknown);
        assert_eq!(normalize_key(KeyCode::F(5)), KeyName::Unknown);
        assert_eq!(normalize_key(KeyCode::PageDown), KeyName::Unknown);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        for code in [KeyCode::Up, KeyCode::Char('x'), KeyCode::Home] {
            assert_eq!(normalize_key(code), normalize_key(code));
        }
    }
}
