//! Builds the derived collections (season totals, team leaders, team records)
//! from games and their boxscores, in the same shapes the store serves them.

use crate::gamelog::load_boxscores;
use crate::resolve::Directory;
use crate::source::DataSource;
use crate::store::DataStore;
use crate::{
    Boxscore, CompetitionType, Game, LeaderEntry, RecordEntry, SeasonTotals, StatLine, Team,
    TeamLeaderGroup, TeamRecordGroup,
};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Categories ranked in leader and record groups.
pub const TRACKED: [&str; 6] = ["pts", "reb", "ast", "stl", "blk", "fg3m"];

/// Single-game performances kept per category in a record group.
pub const RECORD_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Derived {
    pub player_totals: Vec<SeasonTotals>,
    pub team_leaders: Vec<TeamLeaderGroup>,
    pub team_records: Vec<TeamRecordGroup>,
    /// Games left out because their boxscore was unavailable.
    #[serde(skip)]
    pub skipped: usize,
}

/// One player's appearance in one game.
#[derive(Debug, Clone)]
pub struct GameLine<'a> {
    pub game: &'a Game,
    /// Canonical team id when the sheet's key resolves, the raw key otherwise.
    pub team_id: String,
    pub opp: &'a str,
    pub player_id: &'a str,
    /// Rebounds already combined.
    pub stats: StatLine,
}

pub async fn rebuild<S: DataSource>(store: &DataStore<S>) -> Derived {
    let games = store.games().await;
    let teams = store.teams().await;
    let (sheets, skipped) = load_boxscores(store, &games).await;

    let lines = collect_lines(&games, &sheets, &teams);
    debug!("rebuilding derived stats from {} lines, {skipped} games skipped", lines.len());

    Derived {
        player_totals: build_player_totals(&lines),
        team_leaders: build_team_leaders(&lines),
        team_records: build_team_records(&lines),
        skipped,
    }
}

/// Flatten boxscores into per-player lines, dropping did-not-play rows.
/// `sheets` pairs each boxscore with the index of its game in `games`.
pub fn collect_lines<'a>(
    games: &'a [Game],
    sheets: &'a [(usize, Boxscore)],
    teams: &[Team],
) -> Vec<GameLine<'a>> {
    let directory = Directory::new(teams);
    let mut lines = Vec::new();
    for (i, sheet) in sheets {
        let Some(game) = games.get(*i) else { continue };
        for (team_key, players) in sheet.team_blocks() {
            let opp = if team_key == game.home_team { &game.away_team } else { &game.home_team };
            let team_id = directory.canonical_id(team_key);
            for p in players.iter().filter(|p| !p.stats.is_blank()) {
                lines.push(GameLine {
                    game,
                    team_id: team_id.clone(),
                    opp,
                    player_id: &p.player_id,
                    stats: p.stats.clone().with_combined_rebounds(),
                });
            }
        }
    }
    lines
}

/// Per (player, season, type): games played, sums and per-game averages.
pub fn build_player_totals(lines: &[GameLine<'_>]) -> Vec<SeasonTotals> {
    let tallies = group_by(lines, |l| (l.player_id, l.game.season.as_str(), l.game.kind));
    tallies
        .into_iter()
        .map(|((player_id, season, kind), group)| {
            let tally = Tally::over(&group);
            SeasonTotals {
                player_id: player_id.to_owned(),
                season: season.to_owned(),
                kind,
                games: tally.games,
                averages: tally.averages(),
                totals: tally.sums,
            }
        })
        .collect()
}

/// Per (team, season, type): players ranked by per-game average in each
/// tracked category. Players who never recorded the stat are left off.
pub fn build_team_leaders(lines: &[GameLine<'_>]) -> Vec<TeamLeaderGroup> {
    group_by(lines, scope_key)
        .into_iter()
        .map(|((team_id, season, kind), group)| {
            let per_player: Vec<(&str, Tally)> = group_by(&group, |l| l.player_id)
                .into_iter()
                .map(|(player_id, lines)| (player_id, Tally::over(&lines)))
                .collect();

            let leaders = TRACKED
                .iter()
                .map(|&category| {
                    let mut ranked: Vec<LeaderEntry> = per_player
                        .iter()
                        .filter_map(|(player_id, tally)| {
                            let value = tally.average(category)?;
                            (value > 0.0).then(|| LeaderEntry {
                                player_id: (*player_id).to_owned(),
                                value,
                            })
                        })
                        .collect();
                    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
                    (category.to_owned(), ranked)
                })
                .collect();

            TeamLeaderGroup { team_id, season: season_or_wildcard(season), kind, leaders }
        })
        .collect()
}

/// Per (team, season, type): best single-game values in each tracked
/// category, at most [`RECORD_DEPTH`] deep.
pub fn build_team_records(lines: &[GameLine<'_>]) -> Vec<TeamRecordGroup> {
    group_by(lines, scope_key)
        .into_iter()
        .map(|((team_id, season, kind), group)| {
            let records = TRACKED
                .iter()
                .map(|&category| {
                    let mut best: Vec<RecordEntry> = group
                        .iter()
                        .filter_map(|l| {
                            let value = l.stats.get(category).filter(|v| *v > 0.0)?;
                            Some(RecordEntry {
                                player_id: l.player_id.to_owned(),
                                value,
                                date: l.game.date.clone(),
                                game_id: Some(l.game.id.clone()),
                                opp: Some(l.opp.to_owned()),
                            })
                        })
                        .collect();
                    best.sort_by(|a, b| b.value.total_cmp(&a.value));
                    best.truncate(RECORD_DEPTH);
                    (category.to_owned(), best)
                })
                .collect();

            TeamRecordGroup { team_id, season: season_or_wildcard(season), kind, records }
        })
        .collect()
}

fn scope_key(line: &GameLine<'_>) -> (String, String, CompetitionType) {
    (line.team_id.clone(), line.game.season.clone(), line.game.kind)
}

fn season_or_wildcard(season: String) -> Option<String> {
    Some(season).filter(|s| !s.is_empty())
}

/// Group items by key, keeping groups (and items within them) in first-seen
/// order.
fn group_by<'l, T: Clone, K: Eq + Hash + Clone>(
    items: &'l [T],
    key: impl Fn(&'l T) -> K,
) -> Vec<(K, Vec<T>)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(item);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item.clone());
    }
    groups
}

#[derive(Debug, Default)]
struct Tally {
    games: u32,
    sums: BTreeMap<String, f64>,
}

impl Tally {
    fn over(lines: &[GameLine<'_>]) -> Self {
        let mut tally = Tally::default();
        for line in lines {
            tally.games += 1;
            for (category, value) in line.stats.categories() {
                if let Some(v) = value {
                    *tally.sums.entry(category.to_owned()).or_default() += v;
                }
            }
        }
        tally
    }

    fn average(&self, category: &str) -> Option<f64> {
        let sum = self.sums.get(category)?;
        (self.games > 0).then(|| sum / f64::from(self.games))
    }

    fn averages(&self) -> BTreeMap<String, f64> {
        self.sums
            .keys()
            .filter_map(|k| Some((k.clone(), self.average(k)?)))
            .collect()
    }
}
