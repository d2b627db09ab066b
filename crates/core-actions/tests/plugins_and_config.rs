mod common;
use common::*;

use std::io::Write;
use std::time::{Duration, Instant};

use core_actions::{BindingRegistry, Editor, EditorError, HandlerResult, Plugin};
use core_config::{Config, ConfigError, MapEntry};
use core_events::{KeyToken, RawKey};
use core_keymap::{BindingStatus, KeymapError};
use core_state::Mode;
use core_text::LineBuffer;
use pretty_assertions::assert_eq;

/// Binds each notation in `mode` to a handler that reports which binding ran.
struct Reporter {
    name: &'static str,
    mode: Mode,
    keys: &'static [&'static str],
}

impl Plugin for Reporter {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, registry: &mut BindingRegistry<'_>) -> Result<(), KeymapError> {
        for notation in self.keys {
            let label = notation.to_string();
            registry.bind(self.mode, notation, move |_| {
                HandlerResult::message(format!("ran {label}"))
            })?;
        }
        Ok(())
    }
}

const GIT: Reporter = Reporter {
    name: "git",
    mode: Mode::Normal,
    keys: &["<Leader>g", "<Leader>gd"],
};

fn with_git(text: &str) -> Editor {
    let mut ed = editor(text);
    ed.load_plugin(&GIT).unwrap();
    ed
}

#[test]
fn longer_binding_waits_for_next_key() {
    let mut ed = with_git("abc");
    let t0 = Instant::now();
    ed.feed_keys_at("<Leader>g", t0).unwrap();
    assert_eq!(ed.pending_keys().len(), 2);
    assert_eq!(ed.message(), None);
    ed.feed_keys_at("d", t0 + Duration::from_millis(10)).unwrap();
    assert_eq!(ed.message(), Some("ran <Leader>gd"));
    assert!(ed.pending_keys().is_empty());
    assert_eq!(text(&ed), "abc");
}

#[test]
fn timeout_fires_shorter_binding() {
    let mut ed = with_git("abc");
    let t0 = Instant::now();
    ed.feed_keys_at("<Leader>g", t0).unwrap();
    assert!(!ed.check_timeout_at(t0 + Duration::from_millis(999)));
    assert_eq!(ed.message(), None);
    assert!(ed.check_timeout_at(t0 + Duration::from_millis(1000)));
    assert_eq!(ed.message(), Some("ran <Leader>g"));
    assert!(ed.pending_keys().is_empty());
    assert!(!ed.check_timeout_at(t0 + Duration::from_millis(5000)));
}

#[test]
fn unmatched_key_after_leader_passes_both_through() {
    let mut ed = with_git("abc");
    keys(&mut ed, "\\x");
    assert_eq!(text(&ed), "bc");
    assert_eq!(ed.message(), None);
}

#[test]
fn shorter_binding_fires_then_rest_replays() {
    let mut ed = with_git("abc");
    keys(&mut ed, "<Leader>gx");
    assert_eq!(ed.message(), Some("ran <Leader>g"));
    assert_eq!(text(&ed), "bc");
}

#[test]
fn disabled_timeout_waits_until_flush() {
    let mut config = Config::default();
    config.file.input.timeout = false;
    let mut ed = Editor::from_config(LineBuffer::from_str("t", "abc"), &config).unwrap();
    ed.load_plugin(&GIT).unwrap();
    let t0 = Instant::now();
    ed.feed_keys_at("<Leader>g", t0).unwrap();
    assert!(!ed.check_timeout_at(t0 + Duration::from_secs(60)));
    assert_eq!(ed.pending_keys().len(), 2);
    assert!(ed.flush_pending());
    assert_eq!(ed.message(), Some("ran <Leader>g"));
    assert!(!ed.flush_pending());
}

#[test]
fn raw_keys_are_normalized() {
    let mut ed = editor("abc");
    ed.feed(RawKey::Code(0));
    assert_eq!(text(&ed), "abc");
    ed.feed(RawKey::Code(u32::from('x')));
    assert_eq!(text(&ed), "bc");
    ed.feed(RawKey::Code(0x12)); // Ctrl-R
    assert_eq!(text(&ed), "bc");
    ed.feed(RawKey::Code(u32::from('u')));
    assert_eq!(text(&ed), "abc");
    ed.feed(RawKey::Code(0x12));
    assert_eq!(text(&ed), "bc");
}

#[test]
fn feed_token_bypasses_notation() {
    let mut ed = editor("abc");
    ed.feed_token(KeyToken::char('$'));
    ed.feed_token(KeyToken::char('x'));
    assert_eq!(text(&ed), "ab");
}

#[test]
fn second_load_of_same_bindings_conflicts() {
    let mut ed = with_git("abc");
    let err = ed.load_plugin(&GIT).unwrap_err();
    assert!(matches!(err, KeymapError::Conflict { .. }));
    keys(&mut ed, "<Leader>gd");
    assert_eq!(ed.message(), Some("ran <Leader>gd"));
}

#[test]
fn conflict_keeps_earlier_bindings_of_the_plugin() {
    let mut ed = with_git("abc");
    let late = Reporter {
        name: "late",
        mode: Mode::Normal,
        keys: &["<Leader>b", "<Leader>g"],
    };
    assert!(ed.load_plugin(&late).is_err());
    keys(&mut ed, "<Leader>b");
    assert_eq!(ed.message(), Some("ran <Leader>b"));
}

#[test]
fn builtin_keys_shadow_plugin_bindings() {
    struct Shadow;
    impl Plugin for Shadow {
        fn name(&self) -> &str {
            "shadow"
        }
        fn register(&self, registry: &mut BindingRegistry<'_>) -> Result<(), KeymapError> {
            let status = registry.bind(Mode::Normal, "x", |_| HandlerResult::message("plugin x"))?;
            assert_eq!(status, BindingStatus::Shadowed);
            Ok(())
        }
    }
    let mut ed = editor("abc");
    ed.load_plugin(&Shadow).unwrap();
    keys(&mut ed, "x");
    assert_eq!(text(&ed), "bc");
    assert_eq!(ed.message(), None);
}

#[test]
fn plugin_can_change_mode() {
    struct Opener;
    impl Plugin for Opener {
        fn name(&self) -> &str {
            "opener"
        }
        fn register(&self, registry: &mut BindingRegistry<'_>) -> Result<(), KeymapError> {
            registry.bind(Mode::Normal, "<Leader>i", |state| {
                state.cursor.col = 0;
                HandlerResult::to(Mode::Insert)
            })?;
            Ok(())
        }
    }
    let mut ed = editor("abc");
    ed.load_plugin(&Opener).unwrap();
    keys(&mut ed, "$<Leader>i>><Esc>");
    assert_eq!(text(&ed), ">>abc");
    assert_eq!(ed.mode(), Mode::Normal);
    keys(&mut ed, "u");
    assert_eq!(text(&ed), "abc");
}

#[test]
fn insert_mode_plugin_binding() {
    let mut ed = editor("");
    let jj = Reporter {
        name: "jj",
        mode: Mode::Insert,
        keys: &["jk"],
    };
    ed.load_plugin(&jj).unwrap();
    keys(&mut ed, "ijk");
    assert_eq!(ed.message(), Some("ran jk"));
    assert_eq!(text(&ed), "");
    keys(&mut ed, "jx");
    assert_eq!(text(&ed), "jx");
}

#[test]
fn config_file_sets_leader_and_maps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keel.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        r#"
[input]
leader = "<Space>"

[editor]
tab_inserts_spaces = true
shiftwidth = 2

[[map]]
mode = "normal"
keys = "<Leader>w"
command = "w"
"#
    )
    .unwrap();
    let config = core_config::load_from(Some(path)).unwrap();
    let io = MemIo::default();
    let mut ed = Editor::from_config(LineBuffer::from_str("t", "abc"), &config).unwrap();
    ed.set_buffer_io(Box::new(io.clone()));
    ed.set_file_name("m.txt");
    assert_eq!(ed.resolver_config().leader, KeyToken::char(' '));
    assert!(ed.state().options.tab_inserts_spaces);

    keys(&mut ed, "x<Leader>w");
    assert_eq!(io.get("m.txt"), Some(vec!["bc".to_string()]));
    assert!(!ed.state().buffer.is_modified());
}

#[test]
fn reconfigure_moves_plugin_bindings_to_new_leader() {
    let mut ed = with_git("abc");
    let mut config = Config::default();
    config.file.input.leader = ",".to_string();
    ed.reconfigure(&config).unwrap();
    assert_eq!(ed.resolver_config().leader, KeyToken::char(','));
    keys(&mut ed, ",gd");
    assert_eq!(ed.message(), Some("ran <Leader>gd"));
}

#[test]
fn failed_reconfigure_changes_nothing() {
    let mut ed = with_git("abc");
    let mut config = Config::default();
    config.file.input.leader = ",".to_string();
    config.file.map.push(MapEntry {
        mode: "normal".to_string(),
        keys: "<Leader>g".to_string(),
        command: "w".to_string(),
    });
    let err = ed.reconfigure(&config).unwrap_err();
    assert!(matches!(err, EditorError::Keymap(KeymapError::Conflict { .. })));
    assert_eq!(ed.resolver_config().leader, KeyToken::char('\\'));
    keys(&mut ed, "<Leader>gd");
    assert_eq!(ed.message(), Some("ran <Leader>gd"));
}

#[test]
fn unknown_map_mode_is_a_config_error() {
    let mut config = Config::default();
    config.file.map.push(MapEntry {
        mode: "operator".to_string(),
        keys: "x".to_string(),
        command: "q".to_string(),
    });
    let err = Editor::from_config(LineBuffer::from_str("t", ""), &config).err().unwrap();
    assert!(matches!(
        err,
        EditorError::Config(ConfigError::UnknownMode(ref m)) if m == "operator"
    ));
}
