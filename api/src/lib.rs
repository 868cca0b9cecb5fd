pub mod derive;
pub mod gamelog;
pub mod leaders;
pub mod resolve;
pub mod source;
pub mod store;
pub mod totals;

pub use source::{ApiError, ApiResult, DataSource, DirSource, HttpSource, MemorySource};
pub use store::{Collection, DataStore, Entity};

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Raw entities: teams, players, games as served by the data source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(alias = "alternate_name")]
    pub alt_name: Option<String>,
    pub color: Option<String>, // hex, with or without '#'
    pub logo: Option<String>,
    /// Label of the season the team is currently playing, e.g. "2024-25".
    pub season: Option<String>,
    pub league: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub number: Option<String>,
    pub position: Option<String>,
    /// Team identifiers this player has been rostered on.
    #[serde(alias = "team_ids")]
    pub teams: Vec<String>,
    pub images: Vec<String>,
}

impl Player {
    pub fn plays_for(&self, team_id: &str) -> bool {
        self.teams.iter().any(|t| t == team_id)
    }
}

/// Partition of games and every derived statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionType {
    #[default]
    Regular,
    Playoff,
    Preseason,
    /// Any label the data carries that we don't know. Never matches a lookup.
    #[serde(other)]
    Other,
}

impl CompetitionType {
    pub fn label(&self) -> &'static str {
        match self {
            CompetitionType::Regular => "regular",
            CompetitionType::Playoff => "playoff",
            CompetitionType::Preseason => "preseason",
            CompetitionType::Other => "other",
        }
    }
}

impl fmt::Display for CompetitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompetitionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" | "reg" => Ok(CompetitionType::Regular),
            "playoff" | "playoffs" | "post" => Ok(CompetitionType::Playoff),
            "preseason" | "pre" => Ok(CompetitionType::Preseason),
            other => Err(format!(
                "unknown competition type '{other}' (expected regular, playoff or preseason)"
            )),
        }
    }
}

/// Where a game's boxscore lives: a bare path, or a small pointer object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoxscoreRef {
    Path(String),
    Pointer {
        #[serde(alias = "url", alias = "file")]
        path: String,
    },
}

impl BoxscoreRef {
    pub fn path(&self) -> &str {
        match self {
            BoxscoreRef::Path(p) => p,
            BoxscoreRef::Pointer { path } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub id: String,
    pub date: String,
    pub season: String,
    #[serde(rename = "type")]
    pub kind: CompetitionType,
    // Aliases accept the single-team shape the ingest tool writes to games.json.
    #[serde(alias = "team_id")]
    pub home_team: String,
    #[serde(alias = "opp")]
    pub away_team: String,
    #[serde(alias = "score")]
    pub home_score: Option<u32>,
    #[serde(alias = "opp_score")]
    pub away_score: Option<u32>,
    #[serde(alias = "boxscore_json")]
    pub boxscore: Option<BoxscoreRef>,
}

impl Game {
    /// Resource path of this game's boxscore: the embedded reference when there
    /// is one, otherwise `boxscores/{id}.json`.
    pub fn boxscore_path(&self) -> String {
        match &self.boxscore {
            Some(r) if !r.path().trim().is_empty() => source::normalize_path(r.path()),
            _ => format!("boxscores/{}.json", self.id),
        }
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        self.home_score.zip(self.away_score)
    }

    pub fn calendar_date(&self) -> Option<chrono::NaiveDate> {
        gamelog::parse_game_date(&self.date)
    }
}

// ---------------------------------------------------------------------------
// Boxscores, one per game, fetched lazily
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Boxscore {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    /// Team key (id or name, as the game refers to it) → that team's sheet.
    pub teams: BTreeMap<String, TeamBox>,

    // Flat single-team sheet written by the ingest tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<BoxPlayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_totals: Option<StatLine>,
}

impl Boxscore {
    /// Per-team player lists, home side first when the sheet names its sides.
    /// Empty when the sheet has no per-team breakdown.
    pub fn team_blocks(&self) -> Vec<(&str, &[BoxPlayer])> {
        if !self.teams.is_empty() {
            let mut blocks: Vec<(&str, &[BoxPlayer])> = self
                .teams
                .iter()
                .map(|(key, block)| (key.as_str(), block.players.as_slice()))
                .collect();
            blocks.sort_by_key(|(key, _)| self.side_rank(key));
            return blocks;
        }
        match self.team_id.as_deref() {
            Some(key) if !self.players.is_empty() => vec![(key, self.players.as_slice())],
            _ => Vec::new(),
        }
    }

    pub fn has_breakdown(&self) -> bool {
        !self.team_blocks().is_empty()
    }

    fn side_rank(&self, key: &str) -> u8 {
        if self.home_team.as_deref() == Some(key) {
            0
        } else if self.away_team.as_deref() == Some(key) {
            1
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamBox {
    pub players: Vec<BoxPlayer>,
    #[serde(alias = "team_totals")]
    pub totals: Option<StatLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxPlayer {
    #[serde(alias = "id")]
    pub player_id: String,
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub number: Option<String>,
    pub stats: StatLine,
}

/// One player's (or one team's) counting stats for a single game.
///
/// Every field is optional so a sheet that never recorded a category can be
/// told apart from one that recorded a zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub pts: Option<f64>,
    pub oreb: Option<f64>,
    pub dreb: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    #[serde(alias = "to", alias = "tov")]
    pub turnovers: Option<f64>,
    pub pf: Option<f64>,
    #[serde(alias = "plus_minus")]
    pub plusminus: Option<f64>,
    pub fgm: Option<f64>,
    pub fga: Option<f64>,
    pub fg_pct: Option<f64>,
    pub fg3m: Option<f64>,
    pub fg3a: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ftm: Option<f64>,
    pub fta: Option<f64>,
    pub ft_pct: Option<f64>,
}

impl StatLine {
    pub const CATEGORIES: [&'static str; 19] = [
        "pts", "oreb", "dreb", "reb", "ast", "stl", "blk", "turnovers", "pf", "plusminus",
        "fgm", "fga", "fg_pct", "fg3m", "fg3a", "fg3_pct", "ftm", "fta", "ft_pct",
    ];

    pub fn get(&self, category: &str) -> Option<f64> {
        match category {
            "pts" => self.pts,
            "oreb" => self.oreb,
            "dreb" => self.dreb,
            "reb" => self.reb,
            "ast" => self.ast,
            "stl" => self.stl,
            "blk" => self.blk,
            "turnovers" => self.turnovers,
            "pf" => self.pf,
            "plusminus" => self.plusminus,
            "fgm" => self.fgm,
            "fga" => self.fga,
            "fg_pct" => self.fg_pct,
            "fg3m" => self.fg3m,
            "fg3a" => self.fg3a,
            "fg3_pct" => self.fg3_pct,
            "ftm" => self.ftm,
            "fta" => self.fta,
            "ft_pct" => self.ft_pct,
            _ => None,
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> + '_ {
        Self::CATEGORIES.iter().map(|&c| (c, self.get(c)))
    }

    /// Combined rebounds, falling back to the offensive + defensive split.
    pub fn rebounds(&self) -> f64 {
        self.reb
            .unwrap_or_else(|| self.oreb.unwrap_or(0.0) + self.dreb.unwrap_or(0.0))
    }

    /// Fill `reb` from the split when the sheet didn't record it.
    pub fn with_combined_rebounds(mut self) -> Self {
        if self.reb.is_none() {
            self.reb = Some(self.rebounds());
        }
        self
    }

    /// True for a did-not-play line: nothing recorded, or everything zero.
    pub fn is_blank(&self) -> bool {
        self.categories().all(|(_, v)| v.unwrap_or(0.0) == 0.0)
    }
}

// ---------------------------------------------------------------------------
// Derived collections, precomputed per season and competition type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonTotals {
    pub player_id: String,
    pub season: String,
    #[serde(rename = "type")]
    pub kind: CompetitionType,
    pub games: u32,
    pub totals: BTreeMap<String, f64>,
    pub averages: BTreeMap<String, f64>,
}

impl SeasonTotals {
    pub fn average(&self, category: &str) -> Option<f64> {
        self.averages.get(category).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderEntry {
    pub player_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamLeaderGroup {
    #[serde(alias = "team")]
    pub team_id: String,
    /// `None` (or empty) marks a group that applies to any season.
    pub season: Option<String>,
    #[serde(rename = "type")]
    pub kind: CompetitionType,
    /// Stat category → players ranked by per-game value, highest first.
    pub leaders: BTreeMap<String, Vec<LeaderEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordEntry {
    pub player_id: String,
    pub value: f64,
    pub date: String,
    pub game_id: Option<String>,
    pub opp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRecordGroup {
    #[serde(alias = "team")]
    pub team_id: String,
    pub season: Option<String>,
    #[serde(rename = "type")]
    pub kind: CompetitionType,
    /// Stat category → single-game performances, highest first.
    pub records: BTreeMap<String, Vec<RecordEntry>>,
}

// ---------------------------------------------------------------------------
// Query-time results (never cached)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerGameLogEntry {
    pub game_id: String,
    pub date: String,
    pub season: String,
    #[serde(rename = "type")]
    pub kind: CompetitionType,
    pub team: String,
    pub opp: String,
    pub team_score: Option<u32>,
    pub opp_score: Option<u32>,
    /// `reb` is always populated here.
    pub stats: StatLine,
}

impl PlayerGameLogEntry {
    /// 'W' / 'L' / 'T' from the final score, when the game was scored.
    pub fn result(&self) -> Option<char> {
        let (us, them) = self.team_score.zip(self.opp_score)?;
        Some(match us.cmp(&them) {
            std::cmp::Ordering::Greater => 'W',
            std::cmp::Ordering::Less => 'L',
            std::cmp::Ordering::Equal => 'T',
        })
    }
}

/// A player's assembled log plus how many games had to be left out because
/// their boxscore was missing or unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameLog {
    pub entries: Vec<PlayerGameLogEntry>,
    pub skipped: usize,
}

impl GameLog {
    pub fn is_partial(&self) -> bool {
        self.skipped > 0
    }
}

/// Jersey numbers show up both as `"07"` and as `7`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_accepts_ingest_tool_shape() {
        let raw = r#"{
            "id": "game-2025-01-04-pretty-good",
            "team_id": "pretty-good",
            "date": "2025-01-04",
            "season": "2025",
            "type": "regular",
            "score": 61,
            "opp": "Night Owls",
            "opp_score": 55,
            "boxscore_json": "data/boxscores/game-2025-01-04-pretty-good.json"
        }"#;
        let game: Game = serde_json::from_str(raw).unwrap();
        assert_eq!(game.home_team, "pretty-good");
        assert_eq!(game.away_team, "Night Owls");
        assert_eq!(game.score(), Some((61, 55)));
        assert_eq!(game.boxscore_path(), "boxscores/game-2025-01-04-pretty-good.json");
    }

    #[test]
    fn boxscore_path_falls_back_to_convention() {
        let game = Game { id: "g7".into(), ..Default::default() };
        assert_eq!(game.boxscore_path(), "boxscores/g7.json");

        let pointer: Game =
            serde_json::from_str(r#"{"id":"g8","boxscore":{"path":"./box/g8.json"}}"#).unwrap();
        assert_eq!(pointer.boxscore_path(), "box/g8.json");
    }

    #[test]
    fn unknown_competition_type_is_other() {
        let game: Game = serde_json::from_str(r#"{"id":"g1","type":"exhibition"}"#).unwrap();
        assert_eq!(game.kind, CompetitionType::Other);
        assert_eq!("Playoffs".parse::<CompetitionType>(), Ok(CompetitionType::Playoff));
        assert!("exhibition".parse::<CompetitionType>().is_err());
    }

    #[test]
    fn jersey_number_accepts_string_or_number() {
        let a: Player = serde_json::from_str(r#"{"id":"p1","number":23}"#).unwrap();
        let b: Player = serde_json::from_str(r#"{"id":"p2","number":"00"}"#).unwrap();
        let c: Player = serde_json::from_str(r#"{"id":"p3","number":null}"#).unwrap();
        assert_eq!(a.number.as_deref(), Some("23"));
        assert_eq!(b.number.as_deref(), Some("00"));
        assert_eq!(c.number, None);
    }

    #[test]
    fn flat_single_team_boxscore_is_one_block() {
        let raw = r#"{
            "game_id": "g1",
            "team_id": "pretty-good",
            "players": [{"player_id": "23-sam", "name": "Sam", "number": "23", "stats": {"pts": 12}}],
            "team_totals": {"pts": 12}
        }"#;
        let box_score: Boxscore = serde_json::from_str(raw).unwrap();
        let blocks = box_score.team_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0, "pretty-good");
        assert_eq!(blocks[0].1[0].player_id, "23-sam");
    }

    #[test]
    fn named_sides_put_home_block_first() {
        let raw = r#"{
            "home_team": "Owls",
            "away_team": "Hawks",
            "teams": {
                "Hawks": {"players": [{"player_id": "p1"}]},
                "Owls": {"players": [{"player_id": "p7"}]}
            }
        }"#;
        let box_score: Boxscore = serde_json::from_str(raw).unwrap();
        let keys: Vec<&str> = box_score.team_blocks().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["Owls", "Hawks"]);

        let unnamed: Boxscore = serde_json::from_str(
            r#"{"teams":{"B":{"players":[{"player_id":"x"}]},"A":{"players":[{"player_id":"y"}]}}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = unnamed.team_blocks().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn boxscore_without_players_has_no_breakdown() {
        let box_score: Boxscore =
            serde_json::from_str(r#"{"home_team":"A","away_team":"B"}"#).unwrap();
        assert!(!box_score.has_breakdown());
    }

    #[test]
    fn rebounds_fall_back_to_split() {
        let line = StatLine { oreb: Some(2.0), dreb: Some(5.0), ..Default::default() };
        assert_eq!(line.rebounds(), 7.0);
        assert_eq!(line.with_combined_rebounds().reb, Some(7.0));

        let only_def = StatLine { dreb: Some(4.0), ..Default::default() };
        assert_eq!(only_def.with_combined_rebounds().reb, Some(4.0));

        let recorded = StatLine { reb: Some(9.0), oreb: Some(1.0), ..Default::default() };
        assert_eq!(recorded.with_combined_rebounds().reb, Some(9.0));
    }

    #[test]
    fn blank_line_is_dnp() {
        assert!(StatLine::default().is_blank());
        assert!(StatLine { pts: Some(0.0), ..Default::default() }.is_blank());
        assert!(!StatLine { plusminus: Some(-3.0), ..Default::default() }.is_blank());
    }

    #[test]
    fn log_entry_result_from_score() {
        let mut entry = PlayerGameLogEntry {
            team_score: Some(88),
            opp_score: Some(79),
            ..Default::default()
        };
        assert_eq!(entry.result(), Some('W'));
        entry.opp_score = None;
        assert_eq!(entry.result(), None);
    }
}
