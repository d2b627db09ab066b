mod common;
use common::*;

use core_state::Mode;
use proptest::prelude::*;

const START: &str = "one two\n  three\n\nfour, five";

fn key() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "h", "j", "k", "l", "w", "b", "e", "0", "$", "^", "G", "gg", "x", "X", "d", "c", "y",
        "p", "P", "u", "<C-r>", "i", "a", "A", "o", "O", "v", "V", "J", "D", "C", "s", "Y",
        "f", "t", ";", ",", "1", "2", "3", "<Esc>", "<BS>", "<CR>", "<Del>", "q", " ", "\"a",
    ])
}

proptest! {
    #[test]
    fn cursor_stays_on_buffer_and_undo_restores(seq in prop::collection::vec(key(), 1..40)) {
        let mut ed = editor(START);
        for k in &seq {
            keys(&mut ed, k);
            let st = ed.state();
            prop_assert!(st.cursor.row < st.buffer.line_count());
            let len = st.buffer.line_len(st.cursor.row);
            if ed.mode() == Mode::Insert {
                prop_assert!(st.cursor.col <= len);
            } else {
                prop_assert!(st.cursor.col < len.max(1));
            }
        }
        keys(&mut ed, "<Esc><Esc>");
        ed.flush_pending();
        keys(&mut ed, "<Esc>");
        prop_assert_eq!(ed.mode(), Mode::Normal);
        for _ in 0..200 {
            keys(&mut ed, "u");
            if ed.message() == Some("Already at oldest change") {
                break;
            }
        }
        prop_assert_eq!(text(&ed), START);
    }
}
