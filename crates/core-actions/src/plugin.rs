//! Binding registration surface for plugins.
//!
//! A plugin contributes `(mode, notation, handler)` triples at load time. The
//! handler is a closure over `EditorState` returning the same `HandlerResult`
//! a mode handler would, so plugin actions go through the normal result
//! application (mode requests, messages, quit).

use std::sync::Arc;

use core_keymap::{BindingStatus, KeySequence, KeymapError, Keymaps, parse_notation};
use core_state::{EditorState, Mode};
use tracing::info;

use crate::{Action, HandlerResult, PluginHandler};

pub type PluginFn = dyn Fn(&mut EditorState) -> HandlerResult + Send + Sync;

pub trait Plugin {
    fn name(&self) -> &str;

    /// Register bindings. A conflicting registration aborts loading.
    fn register(&self, registry: &mut BindingRegistry<'_>) -> Result<(), KeymapError>;
}

/// Registration view over the editor's keymaps handed to [`Plugin::register`].
pub struct BindingRegistry<'a> {
    plugin: String,
    keymaps: &'a mut Keymaps<Mode, Action>,
    added: Vec<(Mode, KeySequence, PluginHandler)>,
}

impl<'a> BindingRegistry<'a> {
    pub(crate) fn new(plugin: &str, keymaps: &'a mut Keymaps<Mode, Action>) -> Self {
        Self {
            plugin: plugin.to_string(),
            keymaps,
            added: Vec::new(),
        }
    }

    /// Bind `notation` in `mode` to `f`. Keys already bound by a built-in are
    /// accepted but stay shadowed by the built-in.
    pub fn bind<F>(&mut self, mode: Mode, notation: &str, f: F) -> Result<BindingStatus, KeymapError>
    where
        F: Fn(&mut EditorState) -> HandlerResult + Send + Sync + 'static,
    {
        let seq = parse_notation(notation)?;
        let handler = PluginHandler {
            name: format!("{}:{notation}", self.plugin),
            f: Arc::new(f),
        };
        let status = self
            .keymaps
            .register(mode, &seq, Action::Plugin(handler.clone()))?;
        info!(target: "input.map", plugin = %self.plugin, %mode, %seq, ?status, "plugin_binding");
        self.added.push((mode, seq, handler));
        Ok(status)
    }

    pub(crate) fn into_added(self) -> Vec<(Mode, KeySequence, PluginHandler)> {
        self.added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::KeyToken;
    use core_keymap::Match;

    struct Greeter;

    impl Plugin for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn register(&self, registry: &mut BindingRegistry<'_>) -> Result<(), KeymapError> {
            registry.bind(Mode::Normal, "<Leader>h", |_| HandlerResult::message("hello"))?;
            Ok(())
        }
    }

    #[test]
    fn bindings_land_in_keymaps() {
        let mut maps = Keymaps::new();
        let mut reg = BindingRegistry::new("greeter", &mut maps);
        Greeter.register(&mut reg).unwrap();
        let added = reg.into_added();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].2.name, "greeter:<Leader>h");
        let leader = KeyToken::char(',');
        let keys = [KeyToken::char(','), KeyToken::char('h')];
        assert!(matches!(
            maps.lookup(Mode::Normal, &keys, &leader),
            Match::Exact(Action::Plugin(_))
        ));
    }

    #[test]
    fn second_registration_conflicts() {
        let mut maps = Keymaps::new();
        let mut reg = BindingRegistry::new("greeter", &mut maps);
        Greeter.register(&mut reg).unwrap();
        let err = Greeter.register(&mut reg).unwrap_err();
        assert!(matches!(err, KeymapError::Conflict { .. }));
    }
}
