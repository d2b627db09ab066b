mod common;
use common::*;

use core_state::Mode;
use core_text::Position;
use pretty_assertions::assert_eq;

const WORDS: &str = "alpha\nbeta\ngamma\nbeta";

#[test]
fn search_forward_then_repeat_with_wrap() {
    let mut ed = editor(WORDS);
    keys(&mut ed, "/beta<CR>");
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.state().cursor, Position::new(1, 0));
    assert_eq!(ed.message(), None);
    keys(&mut ed, "n");
    assert_eq!(ed.state().cursor, Position::new(3, 0));
    keys(&mut ed, "n");
    assert_eq!(ed.state().cursor, Position::new(1, 0));
    assert_eq!(ed.message(), Some("search hit BOTTOM, continuing at TOP"));
    keys(&mut ed, "N");
    assert_eq!(ed.state().cursor, Position::new(3, 0));
    assert_eq!(ed.message(), Some("search hit TOP, continuing at BOTTOM"));
}

#[test]
fn backward_search_remembers_direction() {
    let mut ed = editor(WORDS);
    keys(&mut ed, "G?a<CR>");
    assert_eq!(ed.state().cursor, Position::new(2, 4));
    keys(&mut ed, "n");
    assert_eq!(ed.state().cursor, Position::new(2, 1));
    keys(&mut ed, "N");
    assert_eq!(ed.state().cursor, Position::new(2, 4));
}

#[test]
fn empty_pattern_reuses_last() {
    let mut ed = editor(WORDS);
    keys(&mut ed, "/gamma<CR>gg/<CR>");
    assert_eq!(ed.state().cursor, Position::new(2, 0));
}

#[test]
fn search_failures_report_and_stay_put() {
    let mut ed = editor(WORDS);
    keys(&mut ed, "n");
    assert_eq!(ed.message(), Some("E35: No previous regular expression"));

    keys(&mut ed, "/zzz<CR>");
    assert_eq!(ed.message(), Some("E486: Pattern not found: zzz"));
    assert_eq!(ed.state().cursor, Position::origin());
    assert_eq!(ed.mode(), Mode::Normal);

    keys(&mut ed, "/a(<CR>");
    assert_eq!(ed.message(), Some("E383: Invalid search string: a("));
    assert_eq!(
        ed.state().last_search.as_ref().map(|s| s.pattern.as_str()),
        Some("zzz")
    );
}

#[test]
fn search_prompt_edits_and_cancels() {
    let mut ed = editor(WORDS);
    keys(&mut ed, "/gax<BS>");
    assert_eq!(ed.snapshot().command_line.as_deref(), Some("/ga"));
    keys(&mut ed, "<BS><BS><BS>");
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.snapshot().command_line, None);
    keys(&mut ed, "/gam<Esc>");
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.state().cursor, Position::origin());
}

#[test]
fn write_needs_a_file_name() {
    let io = MemIo::default();
    let mut ed = editor_with_io("a", &io);
    keys(&mut ed, ":w<CR>");
    assert_eq!(ed.message(), Some("E32: No file name"));
    keys(&mut ed, ":w out.txt<CR>");
    assert_eq!(io.get("out.txt"), Some(vec!["a".to_string()]));
    assert_eq!(ed.state().file_name.as_deref(), Some(std::path::Path::new("out.txt")));
}

#[test]
fn write_saves_and_clears_modified() {
    let io = MemIo::default();
    let mut ed = editor_with_io("a\nb", &io);
    ed.set_file_name("f.txt");
    keys(&mut ed, "x");
    assert!(ed.state().buffer.is_modified());
    keys(&mut ed, ":w<CR>");
    assert_eq!(ed.message(), Some("\"f.txt\" 2L written"));
    assert_eq!(io.get("f.txt"), Some(vec![String::new(), "b".to_string()]));
    assert!(!ed.state().buffer.is_modified());
}

#[test]
fn readonly_write_needs_force() {
    let io = MemIo::default();
    let mut ed = editor_with_io("a", &io);
    ed.set_file_name("ro.txt");
    keys(&mut ed, ":set ro<CR>");
    assert!(ed.state().buffer.is_readonly());
    keys(&mut ed, ":w<CR>");
    assert_eq!(
        ed.message(),
        Some("E45: 'readonly' option is set (add ! to override)")
    );
    assert_eq!(io.get("ro.txt"), None);
    keys(&mut ed, ":w!<CR>");
    assert_eq!(io.get("ro.txt"), Some(vec!["a".to_string()]));
}

#[test]
fn quit_refuses_unsaved_changes() {
    let mut ed = editor("a");
    keys(&mut ed, "x:q<CR>");
    assert!(!ed.should_quit());
    assert_eq!(
        ed.message(),
        Some("E37: No write since last change (add ! to override)")
    );
    keys(&mut ed, ":q!<CR>");
    assert!(ed.should_quit());
}

#[test]
fn quit_on_clean_buffer() {
    let mut ed = editor("a");
    keys(&mut ed, ":quit<CR>");
    assert!(ed.should_quit());
}

#[test]
fn zz_writes_then_quits() {
    let io = MemIo::default();
    let mut ed = editor_with_io("ab", &io);
    ed.set_file_name("z.txt");
    keys(&mut ed, "xZZ");
    assert!(ed.should_quit());
    assert_eq!(io.get("z.txt"), Some(vec!["b".to_string()]));
}

#[test]
fn zq_discards_changes() {
    let io = MemIo::default();
    let mut ed = editor_with_io("ab", &io);
    ed.set_file_name("z.txt");
    keys(&mut ed, "xZQ");
    assert!(ed.should_quit());
    assert_eq!(io.get("z.txt"), None);
}

#[test]
fn edit_replaces_buffer_and_history() {
    let io = MemIo::with_file("other.txt", &["one", "two", "three"]);
    let mut ed = editor_with_io("a", &io);
    keys(&mut ed, "x:e other.txt<CR>");
    assert_eq!(
        ed.message(),
        Some("E37: No write since last change (add ! to override)")
    );
    assert_eq!(text(&ed), "");
    keys(&mut ed, ":e! other.txt<CR>");
    assert_eq!(ed.message(), Some("\"other.txt\" 3L"));
    assert_eq!(lines(&ed), vec!["one", "two", "three"]);
    assert!(!ed.state().buffer.is_modified());
    keys(&mut ed, "u");
    assert_eq!(ed.message(), Some("Already at oldest change"));
    keys(&mut ed, ":e missing.txt<CR>");
    assert_eq!(ed.message(), Some("E484: Can't open file missing.txt"));
    assert_eq!(lines(&ed), vec!["one", "two", "three"]);
}

#[test]
fn load_file_uses_buffer_io() {
    let io = MemIo::with_file("in.txt", &["x", "y"]);
    let mut ed = editor_with_io("", &io);
    ed.load_file(std::path::Path::new("in.txt")).unwrap();
    assert_eq!(lines(&ed), vec!["x", "y"]);
    assert_eq!(ed.state().buffer.name, "in.txt");
    assert!(ed.load_file(std::path::Path::new("nope.txt")).is_err());
}

#[test]
fn line_number_jumps_to_first_non_blank() {
    let mut ed = editor("a\nb\n   c\nd");
    keys(&mut ed, ":3<CR>");
    assert_eq!(ed.state().cursor, Position::new(2, 3));
    keys(&mut ed, ":99<CR>");
    assert_eq!(ed.state().cursor.row, 3);
}

#[test]
fn unknown_command_is_reported() {
    let mut ed = editor("a");
    keys(&mut ed, ":frob<CR>");
    assert_eq!(ed.message(), Some("E492: Not an editor command: frob"));
    assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn registers_listing_shows_contents() {
    let mut ed = editor("one\ntwo");
    keys(&mut ed, "\"ayy");
    keys(&mut ed, ":reg<CR>");
    let msg = ed.message().unwrap().to_string();
    assert!(msg.starts_with("--- Registers ---"));
    assert!(msg.contains("\"a   one^J"));
}

#[test]
fn ex_undo_and_redo() {
    let mut ed = editor("abc");
    keys(&mut ed, "x:undo<CR>");
    assert_eq!(text(&ed), "abc");
    keys(&mut ed, ":redo<CR>");
    assert_eq!(text(&ed), "bc");
    keys(&mut ed, ":redo<CR>");
    assert_eq!(ed.message(), Some("Already at newest change"));
}

#[test]
fn run_command_matches_typed_line() {
    let mut ed = editor("a\nb\nc");
    ed.run_command("2");
    assert_eq!(ed.state().cursor, Position::new(1, 0));
    ed.run_command(":q");
    assert!(ed.should_quit());
}

#[test]
fn shell_command_output_arrives_through_poll() {
    let mut ed = editor("a");
    ed.set_job_runner(Box::new(InlineJobs::default()));
    keys(&mut ed, ":!echo hi<CR>");
    assert_eq!(ed.jobs_in_flight(), 1);
    assert_eq!(ed.poll_jobs(), 1);
    assert_eq!(ed.message(), Some("hi"));
    assert_eq!(ed.poll_jobs(), 0);
}

#[test]
fn failed_shell_command_is_reported() {
    let mut ed = editor("a");
    ed.set_job_runner(Box::new(InlineJobs::default()));
    ed.run_command("!exit 3");
    ed.poll_jobs();
    assert!(ed.message().unwrap().starts_with("[exit 3] failed"));
}
