//! Built-in keymaps. These sit in each mode's built-in layer, so plugin or
//! config bindings for the same keys never take effect.

use core_keymap::{Keymaps, parse_notation};
use core_state::{CharSearchKind, Mode};
use tracing::{debug, error};

use crate::motion::MotionKind;
use crate::operator::OperatorKind;
use crate::{Action, InsertAt};

const VISUAL: &[Mode] = &[Mode::Visual, Mode::VisualLine];
const NORMAL_VISUAL: &[Mode] = &[Mode::Normal, Mode::Visual, Mode::VisualLine];
const PROMPTS: &[Mode] = &[Mode::Command, Mode::Search];

fn bind(maps: &mut Keymaps<Mode, Action>, modes: &[Mode], notation: &str, action: Action) {
    match parse_notation(notation) {
        Ok(seq) => {
            for mode in modes {
                maps.bind_builtin(*mode, &seq, action.clone());
            }
        }
        Err(e) => error!(target: "input.map", notation, error = %e, "builtin_notation_invalid"),
    }
}

pub fn builtin_keymaps() -> Keymaps<Mode, Action> {
    let mut maps = Keymaps::new();
    motions(&mut maps);
    normal(&mut maps);
    visual(&mut maps);
    insert(&mut maps);
    for n in ["<Esc>", "<C-c>"] {
        bind(&mut maps, PROMPTS, n, Action::Escape);
    }
    bind(&mut maps, PROMPTS, "<BS>", Action::Backspace);
    bind(&mut maps, PROMPTS, "<CR>", Action::Enter);
    debug!(target: "input.map", "builtin_keymaps_ready");
    maps
}

/// Motions, counts and the register prefix, shared by Normal and both
/// Visual modes.
fn motions(maps: &mut Keymaps<Mode, Action>) {
    use MotionKind::*;
    let table: &[(&str, MotionKind)] = &[
        ("h", Left),
        ("<Left>", Left),
        ("l", Right),
        ("<Right>", Right),
        ("j", Down),
        ("<Down>", Down),
        ("k", Up),
        ("<Up>", Up),
        ("w", WordForward),
        ("b", WordBackward),
        ("e", WordEnd),
        ("^", FirstNonBlank),
        ("<Home>", LineStart),
        ("$", LineEnd),
        ("<End>", LineEnd),
        ("gg", FileStart),
        ("G", FileEnd),
    ];
    for (n, kind) in table {
        bind(maps, NORMAL_VISUAL, n, Action::Motion(*kind));
    }
    for (n, kind, forward) in [
        ("f", CharSearchKind::Find, true),
        ("F", CharSearchKind::Find, false),
        ("t", CharSearchKind::Till, true),
        ("T", CharSearchKind::Till, false),
    ] {
        bind(maps, NORMAL_VISUAL, n, Action::CharSearch { kind, forward });
    }
    bind(maps, NORMAL_VISUAL, ";", Action::RepeatCharSearch { reverse: false });
    bind(maps, NORMAL_VISUAL, ",", Action::RepeatCharSearch { reverse: true });
    for d in 0..=9u8 {
        bind(maps, NORMAL_VISUAL, &d.to_string(), Action::Count(d));
    }
    bind(maps, NORMAL_VISUAL, "\"", Action::RegisterPrefix);
    bind(maps, NORMAL_VISUAL, "n", Action::SearchNext { reverse: false });
    bind(maps, NORMAL_VISUAL, "N", Action::SearchNext { reverse: true });
    bind(maps, NORMAL_VISUAL, "J", Action::JoinLines);
    bind(maps, NORMAL_VISUAL, ":", Action::CommandLine);
    bind(maps, NORMAL_VISUAL, "<Esc>", Action::Escape);
    bind(maps, NORMAL_VISUAL, "<C-c>", Action::Escape);
}

fn normal(maps: &mut Keymaps<Mode, Action>) {
    const N: &[Mode] = &[Mode::Normal];
    let table: Vec<(&str, Action)> = vec![
        ("d", Action::Operator(OperatorKind::Delete)),
        ("c", Action::Operator(OperatorKind::Change)),
        ("y", Action::Operator(OperatorKind::Yank)),
        ("x", Action::DeleteChar),
        ("<Del>", Action::DeleteChar),
        ("X", Action::DeleteCharBefore),
        ("D", Action::DeleteToLineEnd),
        ("C", Action::ChangeToLineEnd),
        ("s", Action::SubstituteChar),
        ("Y", Action::YankLine),
        ("p", Action::Paste { before: false }),
        ("P", Action::Paste { before: true }),
        ("u", Action::Undo),
        ("<C-r>", Action::Redo),
        ("i", Action::Insert(InsertAt::Cursor)),
        ("<Insert>", Action::Insert(InsertAt::Cursor)),
        ("a", Action::Insert(InsertAt::AfterCursor)),
        ("I", Action::Insert(InsertAt::FirstNonBlank)),
        ("A", Action::Insert(InsertAt::LineEnd)),
        ("o", Action::Insert(InsertAt::LineBelow)),
        ("O", Action::Insert(InsertAt::LineAbove)),
        ("v", Action::Visual { line_mode: false }),
        ("V", Action::Visual { line_mode: true }),
        ("/", Action::Search { forward: true }),
        ("?", Action::Search { forward: false }),
        ("ZZ", Action::Ex("x".to_string())),
        ("ZQ", Action::Ex("q!".to_string())),
    ];
    for (n, action) in table {
        bind(maps, N, n, action);
    }
}

fn visual(maps: &mut Keymaps<Mode, Action>) {
    let table: Vec<(&str, Action)> = vec![
        ("d", Action::Operator(OperatorKind::Delete)),
        ("x", Action::DeleteChar),
        ("<Del>", Action::DeleteChar),
        ("y", Action::Operator(OperatorKind::Yank)),
        ("c", Action::Operator(OperatorKind::Change)),
        ("s", Action::SubstituteChar),
        ("D", Action::DeleteToLineEnd),
        ("X", Action::DeleteToLineEnd),
        ("C", Action::ChangeToLineEnd),
        ("Y", Action::YankLine),
        ("p", Action::Paste { before: false }),
        ("P", Action::Paste { before: true }),
        ("v", Action::Visual { line_mode: false }),
        ("V", Action::Visual { line_mode: true }),
        ("o", Action::SwapAnchor),
    ];
    for (n, action) in table {
        bind(maps, VISUAL, n, action);
    }
}

fn insert(maps: &mut Keymaps<Mode, Action>) {
    const I: &[Mode] = &[Mode::Insert];
    let table: Vec<(&str, Action)> = vec![
        ("<Esc>", Action::Escape),
        ("<C-c>", Action::Escape),
        ("<BS>", Action::Backspace),
        ("<Del>", Action::DeleteForward),
        ("<CR>", Action::Enter),
        ("<Tab>", Action::Tab),
        ("<Left>", Action::Motion(MotionKind::Left)),
        ("<Right>", Action::Motion(MotionKind::Right)),
        ("<Up>", Action::Motion(MotionKind::Up)),
        ("<Down>", Action::Motion(MotionKind::Down)),
        ("<Home>", Action::Motion(MotionKind::LineStart)),
        ("<End>", Action::Motion(MotionKind::LineEnd)),
    ];
    for (n, action) in table {
        bind(maps, I, n, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{KeyToken, NamedKey};
    use core_keymap::Match;

    fn lookup(mode: Mode, keys: &[KeyToken]) -> Option<Action> {
        let maps = builtin_keymaps();
        match maps.lookup(mode, keys, &KeyToken::char('\\')) {
            Match::Exact(a) => Some(a.clone()),
            _ => None,
        }
    }

    #[test]
    fn gg_is_two_keys() {
        let maps = builtin_keymaps();
        let leader = KeyToken::char('\\');
        assert!(matches!(
            maps.lookup(Mode::Normal, &[KeyToken::char('g')], &leader),
            Match::Partial
        ));
        assert!(matches!(
            lookup(Mode::Normal, &[KeyToken::char('g'), KeyToken::char('g')]),
            Some(Action::Motion(MotionKind::FileStart))
        ));
    }

    #[test]
    fn insert_leaves_printables_unbound() {
        assert!(lookup(Mode::Insert, &[KeyToken::char('x')]).is_none());
        assert!(matches!(
            lookup(Mode::Insert, &[KeyToken::named(NamedKey::Esc)]),
            Some(Action::Escape)
        ));
    }

    #[test]
    fn visual_line_shares_visual_bindings() {
        assert!(matches!(
            lookup(Mode::VisualLine, &[KeyToken::char('o')]),
            Some(Action::SwapAnchor)
        ));
        assert!(lookup(Mode::Visual, &[KeyToken::char('i')]).is_none());
    }

    #[test]
    fn redo_is_ctrl_r() {
        assert!(matches!(
            lookup(Mode::Normal, &[KeyToken::ctrl('r')]),
            Some(Action::Redo)
        ));
    }
}
