//! # Presence Roster
//!
//! The list of known peers, rebuilt from every `user_list` snapshot.
//!
//! Order is total and deterministic: peers with recent activity first, then
//! ascending id. The local user never appears.

use std::cmp::Ordering;
use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::types::{Peer, PeerId};

/// How a snapshot is folded into the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterMode {
    /// Drop everything and take the snapshot as-is.
    #[default]
    Replace,
    /// Update known peers in place; peers missing from the snapshot stay
    /// listed but offline.
    Merge,
}

/// Sort key: activity marker first, then id.
pub fn roster_order(a: &Peer, b: &Peer) -> Ordering {
    b.has_activity()
        .cmp(&a.has_activity())
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Default)]
pub struct Roster {
    peers: Vec<Peer>,
    self_id: Option<PeerId>,
    mode: RosterMode,
    /// Peers with messages that arrived while another conversation was open.
    unread: HashSet<PeerId>,
}

impl Roster {
    pub fn new(self_id: Option<PeerId>, mode: RosterMode) -> Self {
        Self {
            peers: Vec::new(),
            self_id,
            mode,
            unread: HashSet::new(),
        }
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn get(&self, index: usize) -> Option<&Peer> {
        self.peers.get(index)
    }

    pub fn position(&self, id: &PeerId) -> Option<usize> {
        self.peers.iter().position(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn self_id(&self) -> Option<&PeerId> {
        self.self_id.as_ref()
    }

    /// Fold a presence snapshot in according to the configured mode.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Peer>) {
        match self.mode {
            RosterMode::Replace => self.replace(snapshot),
            RosterMode::Merge => self.merge(snapshot),
        }
    }

    pub fn replace(&mut self, snapshot: Vec<Peer>) {
        self.peers = snapshot;
        self.finish();
    }

    pub fn merge(&mut self, snapshot: Vec<Peer>) {
        let seen: HashSet<PeerId> = snapshot.iter().map(|p| p.id.clone()).collect();
        for known in self.peers.iter_mut().filter(|p| !seen.contains(&p.id)) {
            known.is_online = false;
        }
        for incoming in snapshot {
            match self.peers.iter_mut().find(|p| p.id == incoming.id) {
                Some(existing) => *existing = incoming,
                None => self.peers.push(incoming),
            }
        }
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(me) = &self.self_id {
            self.peers.retain(|p| &p.id != me);
        }
        let mut seen = HashSet::new();
        self.peers.retain(|p| seen.insert(p.id.clone()));
        self.peers.sort_by(roster_order);
        debug!("Roster rebuilt: {} peers", self.peers.len());
    }

    pub fn mark_unread(&mut self, peer: &PeerId) {
        if self.self_id.as_ref() != Some(peer) {
            self.unread.insert(peer.clone());
        }
    }

    pub fn clear_unread(&mut self, peer: &PeerId) {
        self.unread.remove(peer);
    }

    pub fn is_unread(&self, peer: &PeerId) -> bool {
        self.unread.contains(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, last: Option<&str>, online: bool) -> Peer {
        Peer {
            id: id.into(),
            is_online: online,
            last_message: last.map(str::to_string),
        }
    }

    fn ids(roster: &Roster) -> Vec<&str> {
        roster.peers().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_activity_first_then_id() {
        let mut roster = Roster::new(None, RosterMode::Replace);
        roster.replace(vec![
            peer("b", None, true),
            peer("a", Some("x"), true),
            peer("c", Some("y"), false),
        ]);
        assert_eq!(ids(&roster), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_empty_marker_sorts_with_absent() {
        let mut roster = Roster::new(None, RosterMode::Replace);
        roster.replace(vec![
            peer("b", Some(""), true),
            peer("a", None, true),
            peer("z", Some("hi"), true),
        ]);
        assert_eq!(ids(&roster), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_self_is_filtered() {
        let mut roster = Roster::new(Some("me".into()), RosterMode::Replace);
        roster.replace(vec![peer("me", Some("x"), true), peer("a", None, true)]);
        assert_eq!(ids(&roster), vec!["a"]);
    }

    #[test]
    fn test_replace_drops_missing_peers() {
        let mut roster = Roster::new(None, RosterMode::Replace);
        roster.apply_snapshot(vec![peer("a", None, true), peer("b", None, true)]);
        roster.apply_snapshot(vec![peer("b", None, true)]);
        assert_eq!(ids(&roster), vec!["b"]);
    }

    #[test]
    fn test_merge_keeps_missing_peers_offline() {
        let mut roster = Roster::new(None, RosterMode::Merge);
        roster.apply_snapshot(vec![peer("a", None, true), peer("b", None, true)]);
        roster.apply_snapshot(vec![peer("b", Some("hey"), true)]);
        assert_eq!(ids(&roster), vec!["b", "a"]);
        let a = &roster.peers()[1];
        assert!(!a.is_online);
        assert!(roster.peers()[0].is_online);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut roster = Roster::new(None, RosterMode::Replace);
        roster.replace(vec![peer("a", None, true), peer("a", None, false)]);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_unread_marks() {
        let mut roster = Roster::new(Some("me".into()), RosterMode::Replace);
        roster.mark_unread(&"a".into());
        roster.mark_unread(&"me".into());
        assert!(roster.is_unread(&"a".into()));
        assert!(!roster.is_unread(&"me".into()));
        roster.clear_unread(&"a".into());
        assert!(!roster.is_unread(&"a".into()));
    }
}
