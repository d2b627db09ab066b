//! core-keymap: key notation, layered per-mode keymaps and the key sequence
//! resolver.
//!
//! Design principles:
//! - Resolution is pure over (pending buffer, mode, keymaps, leader); time only
//!   enters through the explicit `*_at(now)` entry points.
//! - Each mode holds a built-in layer and a user layer. Built-ins are matched
//!   first and are never shadowed by a later user or plugin binding.
//! - Leader bindings keep a `<Leader>` sentinel and are resolved against the
//!   configured leader at match time, so changing the leader never rewrites a
//!   keymap.
//! - Logging at TRACE for traversal, DEBUG for resolutions.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use core_events::KeyToken;
use thiserror::Error;
use tracing::{debug, trace};

pub mod notation;
pub mod resolver;
pub mod trie;

pub use notation::{KeySequence, KeyTokenPattern, parse_key, parse_notation};
pub use resolver::{PendingBufferState, Resolution, Resolver, ResolverConfig};
pub use trie::MappingTrie;

#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("empty key notation")]
    EmptyNotation,
    #[error("{notation} is already mapped in {mode} mode")]
    Conflict { mode: String, notation: String },
}

/// Outcome of matching a complete key list against one mode's keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match<'a, A> {
    /// A binding exists for exactly these keys.
    Exact(&'a A),
    /// No binding yet, but some binding extends these keys.
    Partial,
    None,
}

/// Where a successful registration landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    Active,
    /// Accepted, but a built-in binding for the same keys wins at match time.
    Shadowed,
}

/// Bindings for one mode.
#[derive(Debug, Clone)]
pub struct Keymap<A> {
    builtin: MappingTrie<A>,
    user: MappingTrie<A>,
}

impl<A> Default for Keymap<A> {
    fn default() -> Self {
        Self {
            builtin: MappingTrie::default(),
            user: MappingTrie::default(),
        }
    }
}

impl<A> Keymap<A> {
    pub fn bind_builtin(&mut self, seq: &KeySequence, action: A) {
        if self.builtin.insert(seq, action).is_some() {
            trace!(target: "input.map", %seq, "builtin_rebound");
        }
    }

    /// User or plugin binding. A second user binding for the same keys is a
    /// conflict; one that collides with a built-in is accepted as shadowed.
    pub fn bind_user(&mut self, seq: &KeySequence, action: A) -> Result<BindingStatus, String> {
        if self.user.contains(seq) {
            return Err(seq.to_string());
        }
        self.user.insert(seq, action);
        if self.builtin.contains(seq) {
            Ok(BindingStatus::Shadowed)
        } else {
            Ok(BindingStatus::Active)
        }
    }

    pub fn lookup(&self, keys: &[KeyToken], leader: &KeyToken) -> Match<'_, A> {
        if let Some(a) = self
            .builtin
            .exact(keys, leader)
            .or_else(|| self.user.exact(keys, leader))
        {
            return Match::Exact(a);
        }
        if self.has_longer(keys, leader) {
            Match::Partial
        } else {
            Match::None
        }
    }

    pub fn has_longer(&self, keys: &[KeyToken], leader: &KeyToken) -> bool {
        self.builtin.has_longer(keys, leader) || self.user.has_longer(keys, leader)
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All keymaps, keyed by mode.
#[derive(Debug, Clone)]
pub struct Keymaps<M, A> {
    modes: HashMap<M, Keymap<A>>,
}

impl<M, A> Default for Keymaps<M, A> {
    fn default() -> Self {
        Self {
            modes: HashMap::new(),
        }
    }
}

impl<M, A> Keymaps<M, A>
where
    M: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_builtin(&mut self, mode: M, seq: &KeySequence, action: A) {
        self.modes.entry(mode).or_default().bind_builtin(seq, action);
    }

    /// Register a user or plugin binding.
    pub fn register(
        &mut self,
        mode: M,
        seq: &KeySequence,
        action: A,
    ) -> Result<BindingStatus, KeymapError> {
        let status = self
            .modes
            .entry(mode)
            .or_default()
            .bind_user(seq, action)
            .map_err(|notation| KeymapError::Conflict {
                mode: format!("{mode:?}"),
                notation,
            })?;
        match status {
            BindingStatus::Active => debug!(target: "input.map", ?mode, %seq, "binding_registered"),
            BindingStatus::Shadowed => {
                debug!(target: "input.map", ?mode, %seq, "binding_shadowed_by_builtin")
            }
        }
        Ok(status)
    }

    pub fn mode(&self, mode: M) -> Option<&Keymap<A>> {
        self.modes.get(&mode)
    }

    pub fn lookup(&self, mode: M, keys: &[KeyToken], leader: &KeyToken) -> Match<'_, A> {
        match self.modes.get(&mode) {
            Some(map) => map.lookup(keys, leader),
            None => Match::None,
        }
    }

    pub fn has_longer(&self, mode: M, keys: &[KeyToken], leader: &KeyToken) -> bool {
        self.modes
            .get(&mode)
            .is_some_and(|map| map.has_longer(keys, leader))
    }
}
