//! Prefix trie over key patterns. Each mode keeps two of these: one for the
//! built-in bindings and one for user and plugin bindings.

use core_events::KeyToken;
use smallvec::SmallVec;

use crate::notation::{KeySequence, KeyTokenPattern};

#[derive(Debug, Clone)]
struct Node<A> {
    action: Option<A>,
    edges: SmallVec<[(KeyTokenPattern, usize); 4]>,
}

impl<A> Default for Node<A> {
    fn default() -> Self {
        Self {
            action: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTrie<A> {
    nodes: Vec<Node<A>>,
    len: usize,
}

impl<A> Default for MappingTrie<A> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }
}

impl<A> MappingTrie<A> {
    /// Number of bound sequences.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind `seq`, returning the previous action for the same sequence.
    pub fn insert(&mut self, seq: &KeySequence, action: A) -> Option<A> {
        let mut node = 0usize;
        for pat in seq.patterns() {
            let existing = self.nodes[node]
                .edges
                .iter()
                .find(|(p, _)| p == pat)
                .map(|(_, n)| *n);
            node = match existing {
                Some(n) => n,
                None => {
                    let n = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].edges.push((*pat, n));
                    n
                }
            };
        }
        let prev = self.nodes[node].action.replace(action);
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    pub fn contains(&self, seq: &KeySequence) -> bool {
        let mut node = 0usize;
        for pat in seq.patterns() {
            match self.nodes[node].edges.iter().find(|(p, _)| p == pat) {
                Some((_, n)) => node = *n,
                None => return false,
            }
        }
        self.nodes[node].action.is_some()
    }

    /// Nodes reached by `keys`. A key can follow both a literal edge and a
    /// leader edge, so the walk tracks a set; literal edges come first.
    fn walk(&self, keys: &[KeyToken], leader: &KeyToken) -> SmallVec<[usize; 2]> {
        let mut current: SmallVec<[usize; 2]> = SmallVec::new();
        current.push(0);
        for key in keys {
            let mut next: SmallVec<[usize; 2]> = SmallVec::new();
            for &node in &current {
                let edges = &self.nodes[node].edges;
                next.extend(
                    edges
                        .iter()
                        .filter(|(p, _)| matches!(p, KeyTokenPattern::Key(_)))
                        .filter(|(p, _)| p.matches(key, leader))
                        .map(|(_, n)| *n),
                );
                next.extend(
                    edges
                        .iter()
                        .filter(|(p, _)| matches!(p, KeyTokenPattern::Leader))
                        .filter(|(p, _)| p.matches(key, leader))
                        .map(|(_, n)| *n),
                );
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Action bound to exactly `keys`, if any.
    pub fn exact(&self, keys: &[KeyToken], leader: &KeyToken) -> Option<&A> {
        if keys.is_empty() {
            return None;
        }
        self.walk(keys, leader)
            .into_iter()
            .find_map(|n| self.nodes[n].action.as_ref())
    }

    /// True when some bound sequence strictly extends `keys`.
    pub fn has_longer(&self, keys: &[KeyToken], leader: &KeyToken) -> bool {
        self.walk(keys, leader)
            .into_iter()
            .any(|n| !self.nodes[n].edges.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_notation;

    fn seq(s: &str) -> KeySequence {
        parse_notation(s).unwrap()
    }

    fn k(s: &str) -> Vec<KeyToken> {
        s.chars().map(KeyToken::char).collect()
    }

    #[test]
    fn exact_and_longer() {
        let mut t = MappingTrie::default();
        t.insert(&seq("g"), 1);
        t.insert(&seq("gg"), 2);
        let leader = KeyToken::char('\\');
        assert_eq!(t.exact(&k("g"), &leader), Some(&1));
        assert!(t.has_longer(&k("g"), &leader));
        assert_eq!(t.exact(&k("gg"), &leader), Some(&2));
        assert!(!t.has_longer(&k("gg"), &leader));
        assert_eq!(t.exact(&k("gx"), &leader), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn reinsert_replaces() {
        let mut t = MappingTrie::default();
        assert_eq!(t.insert(&seq("x"), 1), None);
        assert_eq!(t.insert(&seq("x"), 2), Some(1));
        assert_eq!(t.len(), 1);
        assert!(t.contains(&seq("x")));
        assert!(!t.contains(&seq("y")));
    }

    #[test]
    fn leader_resolves_at_match_time() {
        let mut t = MappingTrie::default();
        t.insert(&seq("<Leader>w"), 7);
        assert_eq!(t.exact(&k("\\w"), &KeyToken::char('\\')), Some(&7));
        assert_eq!(t.exact(&k(",w"), &KeyToken::char(',')), Some(&7));
        assert_eq!(t.exact(&k(",w"), &KeyToken::char('\\')), None);
    }

    #[test]
    fn literal_edge_preferred_over_leader() {
        let mut t = MappingTrie::default();
        t.insert(&seq("<Leader>"), 1);
        t.insert(&seq(","), 2);
        assert_eq!(t.exact(&k(","), &KeyToken::char(',')), Some(&2));
    }
}
