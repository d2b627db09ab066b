use core_events::{KeyCode, ModMask, NamedKey, RawKey};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers,
};

/// Map a crossterm key event into a raw key for the engine.
///
/// Releases are dropped; presses and repeats both count as keystrokes.
/// Returns `None` for keys the engine has no token for (media keys, lone
/// modifiers, lock keys).
pub(crate) fn map_key_event(event: &CKeyEvent) -> Option<RawKey> {
    if event.kind == CKeyEventKind::Release {
        return None;
    }
    let mut mods = map_mod_mask(event.modifiers);
    if event.code == CKeyCode::BackTab {
        mods |= ModMask::SHIFT;
    }
    let code = map_key_code(&event.code)?;
    Some(RawKey::Event(code, mods))
}

pub(crate) fn map_key_code(code: &CKeyCode) -> Option<KeyCode> {
    let named = match code {
        CKeyCode::Char(c) => return Some(KeyCode::Char(*c)),
        CKeyCode::Enter => NamedKey::Enter,
        CKeyCode::Esc => NamedKey::Esc,
        CKeyCode::Backspace => NamedKey::Backspace,
        CKeyCode::Tab | CKeyCode::BackTab => NamedKey::Tab,
        CKeyCode::Up => NamedKey::Up,
        CKeyCode::Down => NamedKey::Down,
        CKeyCode::Left => NamedKey::Left,
        CKeyCode::Right => NamedKey::Right,
        CKeyCode::Home => NamedKey::Home,
        CKeyCode::End => NamedKey::End,
        CKeyCode::PageUp => NamedKey::PageUp,
        CKeyCode::PageDown => NamedKey::PageDown,
        CKeyCode::Insert => NamedKey::Insert,
        CKeyCode::Delete => NamedKey::Delete,
        CKeyCode::F(n) if (1..=24).contains(n) => NamedKey::F(*n),
        _ => return None,
    };
    Some(KeyCode::Named(named))
}

pub(crate) fn map_mod_mask(mods: CKeyModifiers) -> ModMask {
    let mut out = ModMask::empty();
    if mods.contains(CKeyModifiers::CONTROL) {
        out |= ModMask::CTRL;
    }
    if mods.contains(CKeyModifiers::ALT) {
        out |= ModMask::ALT;
    }
    if mods.contains(CKeyModifiers::SHIFT) {
        out |= ModMask::SHIFT;
    }
    if mods.contains(CKeyModifiers::SUPER) {
        out |= ModMask::SUPER;
    }
    if mods.contains(CKeyModifiers::META) {
        out |= ModMask::META;
    }
    out
}
