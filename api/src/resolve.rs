//! Dual-key identity matching.
//!
//! Games, boxscores and derived groups refer to teams (and sometimes players)
//! by identifier in some records and by display name in others, depending on
//! which ingest run produced them. Every join in the crate goes through here:
//! identifier first, then display name, first entry in collection order wins.

use crate::{Player, Team};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Something with both a stable identifier and a human display name.
pub trait Identity {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
}

impl Identity for Team {
    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Identity for Player {
    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
}

/// True when `key` names `entity` by either of its keys.
pub fn matches_ref<T: Identity>(entity: &T, key: &str) -> bool {
    !key.is_empty() && (entity.id() == key || entity.display_name() == key)
}

/// Two-phase index over a collection: identifier, then display name.
///
/// Build once and reuse when resolving many references against the same list.
pub struct Directory<'a, T> {
    items: &'a [T],
    by_id: HashMap<&'a str, usize>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a, T: Identity> Directory<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut by_name = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            // Duplicate keys keep the earliest entry.
            if let Entry::Vacant(slot) = by_id.entry(item.id()) {
                slot.insert(i);
            }
            if let Entry::Vacant(slot) = by_name.entry(item.display_name()) {
                slot.insert(i);
            }
        }
        Self { items, by_id, by_name }
    }

    pub fn resolve(&self, key: &str) -> Option<&'a T> {
        if key.is_empty() {
            return None;
        }
        self.by_id
            .get(key)
            .or_else(|| self.by_name.get(key))
            .map(|&i| &self.items[i])
    }

    /// Display name for `key`, or `key` itself when nothing matches.
    pub fn label(&self, key: &str) -> String {
        self.resolve(key)
            .map(|item| item.display_name().to_owned())
            .unwrap_or_else(|| key.to_owned())
    }

    /// Canonical identifier for `key`, or `key` itself when nothing matches.
    pub fn canonical_id(&self, key: &str) -> String {
        self.resolve(key)
            .map(|item| item.id().to_owned())
            .unwrap_or_else(|| key.to_owned())
    }
}

pub fn resolve_team<'a>(key: &str, teams: &'a [Team]) -> Option<&'a Team> {
    resolve(key, teams)
}

pub fn resolve_player<'a>(key: &str, players: &'a [Player]) -> Option<&'a Player> {
    resolve(key, players)
}

/// One-off lookup without building an index. Same policy as [`Directory`].
pub fn resolve<'a, T: Identity>(key: &str, items: &'a [T]) -> Option<&'a T> {
    if key.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|item| item.id() == key)
        .or_else(|| items.iter().find(|item| item.display_name() == key))
}

pub fn label_for_team(key: &str, teams: &[Team]) -> String {
    resolve_team(key, teams)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| key.to_owned())
}

pub fn label_for_player(key: &str, players: &[Player]) -> String {
    resolve_player(key, players)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| key.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, name: &str) -> Team {
        Team { id: id.into(), name: name.into(), ..Default::default() }
    }

    fn league() -> Vec<Team> {
        vec![
            team("T1", "Hawks"),
            team("T5", "Wolves"),
            team("T9", "Wolves"),
            team("Owls", "Night Owls"),
            team("T3", "Owls"),
        ]
    }

    #[test]
    fn id_and_name_resolve_to_the_same_team() {
        let teams = league();
        for t in &teams[..2] {
            let by_id = resolve_team(&t.id, &teams).unwrap();
            let by_name = resolve_team(&t.name, &teams).unwrap();
            assert!(std::ptr::eq(by_id, by_name));
        }
    }

    #[test]
    fn shared_name_resolves_to_first_in_collection_order() {
        let teams = league();
        let dir = Directory::new(&teams);
        for _ in 0..3 {
            assert_eq!(resolve_team("Wolves", &teams).unwrap().id, "T5");
            assert_eq!(dir.resolve("Wolves").unwrap().id, "T5");
        }
        assert_eq!(resolve_team("T9", &teams).unwrap().id, "T9");
    }

    #[test]
    fn identifier_phase_wins_over_name_phase() {
        // "Owls" is T3's display name but also another team's identifier.
        let teams = league();
        assert_eq!(resolve_team("Owls", &teams).unwrap().name, "Night Owls");
        assert_eq!(Directory::new(&teams).resolve("Owls").unwrap().name, "Night Owls");
    }

    #[test]
    fn dangling_reference_falls_back_to_raw_key() {
        let teams = league();
        assert!(resolve_team("T404", &teams).is_none());
        assert!(resolve_team("", &teams).is_none());
        assert_eq!(label_for_team("T404", &teams), "T404");
        assert_eq!(label_for_team("T1", &teams), "Hawks");

        let dir = Directory::new(&teams);
        assert_eq!(dir.label("T404"), "T404");
        assert_eq!(dir.canonical_id("Hawks"), "T1");
        assert_eq!(dir.canonical_id("Gone"), "Gone");
    }

    #[test]
    fn players_resolve_by_id_or_name() {
        let players = vec![
            Player { id: "p1".into(), name: "Sam Reyes".into(), ..Default::default() },
            Player { id: "p2".into(), name: "Jo Park".into(), ..Default::default() },
        ];
        assert_eq!(resolve_player("Jo Park", &players).unwrap().id, "p2");
        assert_eq!(label_for_player("p1", &players), "Sam Reyes");
        assert!(matches_ref(&players[0], "p1"));
        assert!(!matches_ref(&players[0], ""));
    }
}
