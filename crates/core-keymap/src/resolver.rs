//! Key sequence resolver: pending buffer, per-mode matching and the timeout
//! that disambiguates a short binding from a longer one sharing its prefix.
//!
//! The resolver never reads a clock on its own behalf except in the
//! convenience wrappers; the `*_at` variants take `now` explicitly. The host
//! loop must push every key it has read before asking `check_timeout`, since
//! the timeout re-evaluates the complete pending buffer.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use core_events::{KeyToken, RawKey, normalize};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{Keymaps, Match};

/// Immutable resolver settings. Changing them means building a new resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub leader: KeyToken,
    /// `None` waits indefinitely for a longer match.
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            leader: KeyToken::char('\\'),
            timeout: Some(Duration::from_millis(1000)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingBufferState {
    /// Key appended; `len` keys now pending.
    Accepted { len: usize },
    /// The raw key could not be normalized; buffer untouched.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<A> {
    /// A binding fired. `replay` holds keys that were buffered after the
    /// matched sequence and must be fed again.
    Handled { action: A, replay: Vec<KeyToken> },
    /// Waiting for more keys (or the timeout).
    Pending,
    /// No binding applies; `key` goes to the mode handler as-is, followed by
    /// the `replay` keys.
    Passthrough { key: KeyToken, replay: Vec<KeyToken> },
    /// The raw key did not normalize to a token.
    Rejected,
}

#[derive(Debug)]
pub struct Resolver<M, A> {
    config: ResolverConfig,
    keymaps: Keymaps<M, A>,
    pending: SmallVec<[KeyToken; 8]>,
    last_push: Option<Instant>,
}

impl<M, A> Resolver<M, A>
where
    M: Copy + Eq + Hash + Debug,
    A: Clone,
{
    pub fn new(config: ResolverConfig, keymaps: Keymaps<M, A>) -> Self {
        Self {
            config,
            keymaps,
            pending: SmallVec::new(),
            last_push: None,
        }
    }

    /// Rebuild with a new configuration, keeping the registered keymaps.
    /// Pending keys are dropped.
    pub fn reconfigure(self, config: ResolverConfig) -> Self {
        debug!(target: "input.resolver", leader = %config.leader, timeout = ?config.timeout, "reconfigure");
        Self::new(config, self.keymaps)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn keymaps(&self) -> &Keymaps<M, A> {
        &self.keymaps
    }

    pub fn keymaps_mut(&mut self) -> &mut Keymaps<M, A> {
        &mut self.keymaps
    }

    pub fn pending(&self) -> &[KeyToken] {
        &self.pending
    }

    pub fn push(&mut self, raw: RawKey) -> PendingBufferState {
        self.push_at(raw, Instant::now())
    }

    pub fn push_at(&mut self, raw: RawKey, now: Instant) -> PendingBufferState {
        match normalize(raw) {
            Some(key) => self.push_token_at(key, now),
            None => {
                trace!(target: "input.resolver", ?raw, "normalize_rejected");
                PendingBufferState::Rejected
            }
        }
    }

    pub fn push_token_at(&mut self, key: KeyToken, now: Instant) -> PendingBufferState {
        self.pending.push(key);
        self.last_push = Some(now);
        trace!(target: "input.resolver", %key, len = self.pending.len(), "push");
        PendingBufferState::Accepted {
            len: self.pending.len(),
        }
    }

    pub fn match_keys(&self, mode: M, keys: &[KeyToken]) -> Match<'_, A> {
        self.keymaps.lookup(mode, keys, &self.config.leader)
    }

    pub fn longer_sequences(&self, mode: M, keys: &[KeyToken]) -> bool {
        self.keymaps.has_longer(mode, keys, &self.config.leader)
    }

    pub fn process(&mut self, raw: RawKey, mode: M) -> Resolution<A> {
        self.process_at(raw, mode, Instant::now())
    }

    pub fn process_at(&mut self, raw: RawKey, mode: M, now: Instant) -> Resolution<A> {
        match self.push_at(raw, now) {
            PendingBufferState::Accepted { .. } => self.resolve_pending(mode),
            PendingBufferState::Rejected => Resolution::Rejected,
        }
    }

    pub fn process_token_at(&mut self, key: KeyToken, mode: M, now: Instant) -> Resolution<A> {
        self.push_token_at(key, now);
        self.resolve_pending(mode)
    }

    fn resolve_pending(&mut self, mode: M) -> Resolution<A> {
        let exact = match self.match_keys(mode, &self.pending) {
            Match::Exact(a) => Some(a.clone()),
            Match::Partial => {
                trace!(target: "input.resolver", len = self.pending.len(), "partial");
                return Resolution::Pending;
            }
            Match::None => None,
        };
        match exact {
            Some(_) if self.longer_sequences(mode, &self.pending) => {
                trace!(target: "input.resolver", len = self.pending.len(), "exact_with_longer");
                Resolution::Pending
            }
            Some(action) => {
                debug!(target: "input.resolver", ?mode, keys = %self.pending_notation(), "handled");
                self.clear();
                Resolution::Handled {
                    action,
                    replay: Vec::new(),
                }
            }
            None => self.flush_keys(mode),
        }
    }

    pub fn check_timeout(&mut self, mode: M) -> Option<Resolution<A>> {
        self.check_timeout_at(mode, Instant::now())
    }

    /// Resolve the pending buffer if the timeout has elapsed since the last
    /// push. Returns `None` when nothing is pending, the timeout is disabled,
    /// or it has not elapsed yet.
    pub fn check_timeout_at(&mut self, mode: M, now: Instant) -> Option<Resolution<A>> {
        let timeout = self.config.timeout?;
        let last = self.last_push?;
        if self.pending.is_empty() || now.saturating_duration_since(last) < timeout {
            return None;
        }
        debug!(target: "input.resolver", ?mode, keys = %self.pending_notation(), "timeout");
        self.flush(mode)
    }

    /// Resolve the pending buffer immediately, as if the timeout had fired.
    pub fn flush(&mut self, mode: M) -> Option<Resolution<A>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.flush_keys(mode))
    }

    /// Longest pending prefix with an exact binding fires; otherwise the
    /// first key passes through. Either way the rest is handed back for
    /// replay and the buffer is cleared. A plain passthrough of the first
    /// key would drop the keys typed after it, so a dead-end `<Leader>gx`
    /// with `<Leader>g` bound runs `<Leader>g` and then `x`.
    fn flush_keys(&mut self, mode: M) -> Resolution<A> {
        let keys: Vec<KeyToken> = self.pending.to_vec();
        self.clear();
        for end in (1..=keys.len()).rev() {
            if let Match::Exact(a) = self.match_keys(mode, &keys[..end]) {
                debug!(target: "input.resolver", ?mode, consumed = end, "handled_prefix");
                return Resolution::Handled {
                    action: a.clone(),
                    replay: keys[end..].to_vec(),
                };
            }
        }
        trace!(target: "input.resolver", ?mode, key = %keys[0], "passthrough");
        Resolution::Passthrough {
            key: keys[0],
            replay: keys[1..].to_vec(),
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.last_push = None;
    }

    fn pending_notation(&self) -> String {
        self.pending.iter().map(|k| k.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_notation;
    use core_events::{KeyCode, ModMask, NamedKey};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum M {
        Normal,
        Insert,
    }

    fn resolver(bindings: &[(&str, &'static str)]) -> Resolver<M, &'static str> {
        let mut maps = Keymaps::new();
        for (n, a) in bindings {
            maps.register(M::Normal, &parse_notation(n).unwrap(), *a).unwrap();
        }
        Resolver::new(ResolverConfig::default(), maps)
    }

    fn ch(c: char) -> RawKey {
        RawKey::Code(c as u32)
    }

    #[test]
    fn leader_short_and_long_binding() {
        let t0 = Instant::now();
        let mut r = resolver(&[("<Leader>g", "short"), ("<Leader>gd", "long")]);
        assert_eq!(r.process_at(ch('\\'), M::Normal, t0), Resolution::Pending);
        assert_eq!(r.process_at(ch('g'), M::Normal, t0), Resolution::Pending);
        assert_eq!(
            r.process_at(ch('d'), M::Normal, t0),
            Resolution::Handled {
                action: "long",
                replay: vec![]
            }
        );
        assert!(r.pending().is_empty());
    }

    #[test]
    fn timeout_fires_shorter_exact_binding() {
        let t0 = Instant::now();
        let mut r = resolver(&[("<Leader>g", "short"), ("<Leader>gd", "long")]);
        r.process_at(ch('\\'), M::Normal, t0);
        r.process_at(ch('g'), M::Normal, t0);
        let early = t0 + Duration::from_millis(999);
        assert_eq!(r.check_timeout_at(M::Normal, early), None);
        let late = t0 + Duration::from_millis(1000);
        assert_eq!(
            r.check_timeout_at(M::Normal, late),
            Some(Resolution::Handled {
                action: "short",
                replay: vec![]
            })
        );
        assert_eq!(r.check_timeout_at(M::Normal, late), None);
    }

    #[test]
    fn timeout_on_partial_passes_first_key_through() {
        let t0 = Instant::now();
        let mut r = resolver(&[("<Leader>gd", "long")]);
        r.process_at(ch('\\'), M::Normal, t0);
        r.process_at(ch('g'), M::Normal, t0);
        assert_eq!(
            r.check_timeout_at(M::Normal, t0 + Duration::from_secs(2)),
            Some(Resolution::Passthrough {
                key: KeyToken::char('\\'),
                replay: vec![KeyToken::char('g')]
            })
        );
    }

    #[test]
    fn unmatched_key_passes_through_and_clears() {
        let mut r = resolver(&[("<Leader>gd", "long")]);
        assert_eq!(
            r.process(ch('x'), M::Normal),
            Resolution::Passthrough {
                key: KeyToken::char('x'),
                replay: vec![]
            }
        );
        assert!(r.pending().is_empty());
    }

    #[test]
    fn divergence_replays_buffered_keys() {
        let t0 = Instant::now();
        let mut r = resolver(&[("<Leader>g", "short"), ("<Leader>gd", "long")]);
        r.process_at(ch('\\'), M::Normal, t0);
        r.process_at(ch('g'), M::Normal, t0);
        assert_eq!(
            r.process_at(ch('x'), M::Normal, t0),
            Resolution::Handled {
                action: "short",
                replay: vec![KeyToken::char('x')]
            }
        );
    }

    #[test]
    fn exact_without_longer_fires_immediately() {
        let mut r = resolver(&[("<C-s>", "save")]);
        let raw = RawKey::Event(KeyCode::Char('s'), ModMask::CTRL);
        assert_eq!(
            r.process(raw, M::Normal),
            Resolution::Handled {
                action: "save",
                replay: vec![]
            }
        );
    }

    #[test]
    fn keymaps_are_per_mode() {
        let mut r = resolver(&[("jk", "escape")]);
        assert_eq!(r.process(ch('j'), M::Normal), Resolution::Pending);
        r.clear();
        assert_eq!(
            r.process(ch('j'), M::Insert),
            Resolution::Passthrough {
                key: KeyToken::char('j'),
                replay: vec![]
            }
        );
    }

    #[test]
    fn rejected_raw_key_leaves_buffer() {
        let mut r = resolver(&[("<Leader>gd", "long")]);
        r.process(ch('\\'), M::Normal);
        assert_eq!(r.push(RawKey::Code(0xD800)), PendingBufferState::Rejected);
        assert_eq!(r.pending(), &[KeyToken::char('\\')]);
    }

    #[test]
    fn disabled_timeout_never_fires() {
        let t0 = Instant::now();
        let mut r = resolver(&[("<Leader>g", "short"), ("<Leader>gd", "long")]).reconfigure(
            ResolverConfig {
                leader: KeyToken::char(','),
                timeout: None,
            },
        );
        r.process_at(ch(','), M::Normal, t0);
        assert_eq!(
            r.check_timeout_at(M::Normal, t0 + Duration::from_secs(60)),
            None
        );
        assert_eq!(
            r.flush(M::Normal),
            Some(Resolution::Passthrough {
                key: KeyToken::char(','),
                replay: vec![]
            })
        );
    }

    #[test]
    fn named_keys_resolve() {
        let mut r = resolver(&[("<Esc><Esc>", "double")]);
        r.process(RawKey::Code(0x1b), M::Normal);
        assert_eq!(
            r.process(
                RawKey::Event(KeyCode::Named(NamedKey::Esc), ModMask::empty()),
                M::Normal
            ),
            Resolution::Handled {
                action: "double",
                replay: vec![]
            }
        );
    }
}
