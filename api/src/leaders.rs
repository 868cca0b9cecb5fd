use crate::resolve::matches_ref;
use crate::{CompetitionType, LeaderEntry, RecordEntry, Team, TeamLeaderGroup, TeamRecordGroup};

/// Season + competition type a lookup is restricted to. `season: None` means
/// any season.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub season: Option<String>,
    pub kind: CompetitionType,
}

impl Scope {
    pub fn new(season: Option<&str>, kind: CompetitionType) -> Self {
        Self {
            season: season.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned),
            kind,
        }
    }

    pub fn any_season(kind: CompetitionType) -> Self {
        Self { season: None, kind }
    }
}

/// Common shape of leader and record groups.
pub trait ScopedGroup {
    fn team_key(&self) -> &str;
    fn season(&self) -> Option<&str>;
    fn kind(&self) -> CompetitionType;
}

impl ScopedGroup for TeamLeaderGroup {
    fn team_key(&self) -> &str {
        &self.team_id
    }
    fn season(&self) -> Option<&str> {
        self.season.as_deref().filter(|s| !s.is_empty())
    }
    fn kind(&self) -> CompetitionType {
        self.kind
    }
}

impl ScopedGroup for TeamRecordGroup {
    fn team_key(&self) -> &str {
        &self.team_id
    }
    fn season(&self) -> Option<&str> {
        self.season.as_deref().filter(|s| !s.is_empty())
    }
    fn kind(&self) -> CompetitionType {
        self.kind
    }
}

impl TeamLeaderGroup {
    /// First `n` leaders in `category`; the stored list is already ranked.
    pub fn top(&self, category: &str, n: usize) -> &[LeaderEntry] {
        self.leaders
            .get(category)
            .map(|list| &list[..n.min(list.len())])
            .unwrap_or_default()
    }
}

impl TeamRecordGroup {
    pub fn top(&self, category: &str, n: usize) -> &[RecordEntry] {
        self.records
            .get(category)
            .map(|list| &list[..n.min(list.len())])
            .unwrap_or_default()
    }
}

pub fn find_leader_group<'a>(
    team: &Team,
    scope: &Scope,
    groups: &'a [TeamLeaderGroup],
) -> Option<&'a TeamLeaderGroup> {
    find_group(team, scope, groups)
}

pub fn find_record_group<'a>(
    team: &Team,
    scope: &Scope,
    groups: &'a [TeamRecordGroup],
) -> Option<&'a TeamRecordGroup> {
    find_group(team, scope, groups)
}

/// Most recent season's leader group for `team` and `kind`.
pub fn latest_leader_group<'a>(
    team: &Team,
    kind: CompetitionType,
    groups: &'a [TeamLeaderGroup],
) -> Option<&'a TeamLeaderGroup> {
    latest_group(team, kind, groups)
}

pub fn latest_record_group<'a>(
    team: &Team,
    kind: CompetitionType,
    groups: &'a [TeamRecordGroup],
) -> Option<&'a TeamRecordGroup> {
    latest_group(team, kind, groups)
}

/// First group for `team` within `scope`, in collection order. A group with
/// no season of its own matches any requested season.
pub fn find_group<'a, G: ScopedGroup>(team: &Team, scope: &Scope, groups: &'a [G]) -> Option<&'a G> {
    groups.iter().find(|g| {
        g.kind() == scope.kind
            && matches_ref(team, g.team_key())
            && match (scope.season.as_deref(), g.season()) {
                (Some(wanted), Some(season)) => season == wanted,
                _ => true,
            }
    })
}

/// Greatest season label wins; season-less groups only when nothing else is
/// there. Equal labels keep the earlier group.
pub fn latest_group<'a, G: ScopedGroup>(
    team: &Team,
    kind: CompetitionType,
    groups: &'a [G],
) -> Option<&'a G> {
    groups
        .iter()
        .filter(|g| g.kind() == kind && matches_ref(team, g.team_key()))
        .fold(None, |best: Option<&'a G>, g| match best {
            Some(b) if g.season() <= b.season() => Some(b),
            _ => Some(g),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn team() -> Team {
        Team { id: "T1".into(), name: "Hawks".into(), ..Default::default() }
    }

    fn leaders(team: &str, season: Option<&str>, kind: CompetitionType, top: &str) -> TeamLeaderGroup {
        let mut map = BTreeMap::new();
        map.insert(
            "pts".to_owned(),
            vec![
                LeaderEntry { player_id: top.into(), value: 21.5 },
                LeaderEntry { player_id: "p2".into(), value: 14.0 },
                LeaderEntry { player_id: "p3".into(), value: 14.0 },
            ],
        );
        TeamLeaderGroup {
            team_id: team.into(),
            season: season.map(str::to_owned),
            kind,
            leaders: map,
        }
    }

    #[test]
    fn wildcard_group_answers_an_unknown_season() {
        let groups = vec![
            leaders("T1", Some("2022-23"), CompetitionType::Regular, "old"),
            leaders("T1", None, CompetitionType::Regular, "any"),
        ];
        let scope = Scope::new(Some("2023-24"), CompetitionType::Regular);
        let found = find_leader_group(&team(), &scope, &groups).unwrap();
        assert_eq!(found.top("pts", 1)[0].player_id, "any");
    }

    #[test]
    fn earlier_wildcard_wins_over_later_exact_season() {
        let groups = vec![
            leaders("T1", None, CompetitionType::Regular, "any"),
            leaders("Hawks", Some("2023-24"), CompetitionType::Regular, "exact"),
        ];
        let scope = Scope::new(Some("2023-24"), CompetitionType::Regular);
        let found = find_leader_group(&team(), &scope, &groups).unwrap();
        assert!(std::ptr::eq(found, &groups[0]));

        let reversed: Vec<TeamLeaderGroup> = groups.into_iter().rev().collect();
        let found = find_leader_group(&team(), &scope, &reversed).unwrap();
        assert_eq!(found.top("pts", 1)[0].player_id, "exact");
    }

    #[test]
    fn other_seasons_are_passed_over() {
        let groups = vec![
            leaders("T1", Some("2022-23"), CompetitionType::Regular, "old"),
            leaders("T1", Some("2023-24"), CompetitionType::Regular, "current"),
        ];
        let scope = Scope::new(Some("2023-24"), CompetitionType::Regular);
        let found = find_leader_group(&team(), &scope, &groups).unwrap();
        assert_eq!(found.top("pts", 1)[0].player_id, "current");
        assert!(find_leader_group(&team(), &Scope::new(Some("2019-20"), CompetitionType::Regular), &groups).is_none());
    }

    #[test]
    fn no_season_takes_first_in_collection_order() {
        let groups = vec![
            leaders("T2", Some("2024-25"), CompetitionType::Regular, "other-team"),
            leaders("T1", Some("2022-23"), CompetitionType::Regular, "first"),
            leaders("T1", Some("2024-25"), CompetitionType::Regular, "newer"),
        ];
        let found = find_leader_group(&team(), &Scope::any_season(CompetitionType::Regular), &groups);
        assert_eq!(found.unwrap().top("pts", 1)[0].player_id, "first");

        let latest = latest_leader_group(&team(), CompetitionType::Regular, &groups).unwrap();
        assert_eq!(latest.top("pts", 1)[0].player_id, "newer");
    }

    #[test]
    fn type_must_match_exactly() {
        let groups = vec![leaders("T1", Some("2023-24"), CompetitionType::Playoff, "p")];
        let regular = Scope::new(Some("2023-24"), CompetitionType::Regular);
        assert!(find_leader_group(&team(), &regular, &groups).is_none());
        assert!(latest_leader_group(&team(), CompetitionType::Regular, &groups).is_none());
    }

    #[test]
    fn top_truncates_but_group_keeps_full_list() {
        let group = leaders("T1", None, CompetitionType::Regular, "p1");
        let top2: Vec<&str> = group.top("pts", 2).iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(top2, vec!["p1", "p2"]);
        assert_eq!(group.top("pts", 10).len(), 3);
        assert!(group.top("ast", 3).is_empty());
        assert_eq!(group.leaders["pts"].len(), 3);
    }

    #[test]
    fn record_groups_use_the_same_rules() {
        let mut records = BTreeMap::new();
        records.insert(
            "pts".to_owned(),
            vec![RecordEntry {
                player_id: "p1".into(),
                value: 41.0,
                date: "2024-02-10".into(),
                ..Default::default()
            }],
        );
        let groups = vec![TeamRecordGroup {
            team_id: "Hawks".into(),
            season: Some(String::new()),
            kind: CompetitionType::Regular,
            records,
        }];
        let scope = Scope::new(Some("2019-20"), CompetitionType::Regular);
        let found = find_record_group(&team(), &scope, &groups).unwrap();
        assert_eq!(found.top("pts", 5)[0].value, 41.0);
        assert!(latest_record_group(&team(), CompetitionType::Regular, &groups).is_some());
    }

    #[test]
    fn blank_scope_season_is_any_season() {
        assert_eq!(Scope::new(Some("  "), CompetitionType::Regular).season, None);
    }
}
