//! Display-ready page models built from the stats core, plus their plain-text
//! rendering. Each builder returns `None` when the requested entity doesn't
//! exist; empty sections are rendered as an explicit empty-state line.

use serde::Serialize;
use stats_api::gamelog::{build_game_log, parse_game_date};
use stats_api::leaders::{
    Scope, find_leader_group, find_record_group, latest_leader_group, latest_record_group,
};
use stats_api::resolve::{Directory, matches_ref, resolve_player, resolve_team};
use stats_api::totals::{current_season_totals, season_history};
use stats_api::{
    CompetitionType, DataSource, DataStore, Game, Player, SeasonTotals, StatLine, Team,
};
use std::cmp::Reverse;
use std::fmt;

// ---------------------------------------------------------------------------
// Teams listing
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TeamsPage {
    pub teams: Vec<TeamRow>,
}

#[derive(Debug, Serialize)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub league: Option<String>,
    pub season: Option<String>,
    pub roster_size: usize,
}

pub async fn teams_page<S: DataSource>(store: &DataStore<S>) -> TeamsPage {
    let teams = store.teams().await;
    let players = store.players().await;
    let teams = teams
        .iter()
        .map(|t| TeamRow {
            id: t.id.clone(),
            name: t.name.clone(),
            league: t.league.clone(),
            season: t.season.clone(),
            roster_size: players.iter().filter(|p| p.plays_for(&t.id)).count(),
        })
        .collect();
    TeamsPage { teams }
}

impl fmt::Display for TeamsPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.teams.is_empty() {
            return writeln!(f, "No teams on file.");
        }
        writeln!(f, "{:<16} {:<28} {:<12} {:<10} {:>7}", "ID", "TEAM", "LEAGUE", "SEASON", "PLAYERS")?;
        for t in &self.teams {
            writeln!(
                f,
                "{:<16} {:<28} {:<12} {:<10} {:>7}",
                t.id,
                t.name,
                t.league.as_deref().unwrap_or("-"),
                t.season.as_deref().unwrap_or("-"),
                t.roster_size
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Team page
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TeamPage {
    pub team: Team,
    pub kind: CompetitionType,
    /// Season the schedule, leader and record sections are for, when one could
    /// be determined. `None` lists every season's games.
    pub season: Option<String>,
    pub roster: Vec<RosterRow>,
    pub schedule: Vec<ScheduleRow>,
    pub leaders: Option<Vec<Board>>,
    pub records: Option<Vec<Board>>,
}

#[derive(Debug, Serialize)]
pub struct RosterRow {
    pub id: String,
    pub name: String,
    pub number: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleRow {
    pub game_id: String,
    pub date: String,
    pub home: bool,
    pub opponent: String,
    pub score: Option<(u32, u32)>, // (team, opponent)
}

/// One category's ranked list, already cut to the display depth.
#[derive(Debug, Serialize)]
pub struct Board {
    pub category: String,
    pub rows: Vec<BoardRow>,
}

#[derive(Debug, Serialize)]
pub struct BoardRow {
    pub player: String,
    pub value: f64,
    pub date: Option<String>,
    pub opp: Option<String>,
}

pub async fn team_page<S: DataSource>(
    store: &DataStore<S>,
    team_ref: &str,
    season: Option<&str>,
    kind: CompetitionType,
    top: usize,
) -> Option<TeamPage> {
    let teams = store.teams().await;
    let team = resolve_team(team_ref, &teams)?.clone();

    let players = store.players().await;
    let games = store.games().await;
    let leader_groups = store.team_leaders().await;
    let record_groups = store.team_records().await;

    let scope = Scope::new(season, kind);
    let (leader_group, record_group) = if scope.season.is_some() {
        (
            find_leader_group(&team, &scope, &leader_groups),
            find_record_group(&team, &scope, &record_groups),
        )
    } else {
        (
            latest_leader_group(&team, kind, &leader_groups),
            latest_record_group(&team, kind, &record_groups),
        )
    };
    let shown_season = scope
        .season
        .clone()
        .or_else(|| leader_group.and_then(|g| g.season.clone()))
        .or_else(|| record_group.and_then(|g| g.season.clone()));

    let directory = Directory::new(&players);
    let team_directory = Directory::new(&teams);
    let leaders = leader_group.map(|g| {
        g.leaders
            .keys()
            .map(|category| Board {
                category: category.clone(),
                rows: g
                    .top(category, top)
                    .iter()
                    .map(|e| BoardRow {
                        player: directory.label(&e.player_id),
                        value: e.value,
                        date: None,
                        opp: None,
                    })
                    .collect(),
            })
            .collect()
    });
    let records = record_group.map(|g| {
        g.records
            .keys()
            .map(|category| Board {
                category: category.clone(),
                rows: g
                    .top(category, top)
                    .iter()
                    .map(|e| BoardRow {
                        player: directory.label(&e.player_id),
                        value: e.value,
                        date: Some(e.date.clone()),
                        opp: e.opp.as_deref().map(|o| team_directory.label(o)),
                    })
                    .collect(),
            })
            .collect()
    });

    let roster = players
        .iter()
        .filter(|p| p.plays_for(&team.id))
        .map(|p| RosterRow {
            id: p.id.clone(),
            name: p.name.clone(),
            number: p.number.clone(),
            position: p.position.clone(),
        })
        .collect();

    let mut schedule: Vec<ScheduleRow> = games
        .iter()
        .filter(|g| g.kind == kind && shown_season.as_deref().is_none_or(|s| g.season == s))
        .filter_map(|g| schedule_row(&team, g, &team_directory))
        .collect();
    schedule.sort_by_cached_key(|row| Reverse(parse_game_date(&row.date)));

    Some(TeamPage {
        team,
        kind,
        season: shown_season,
        roster,
        schedule,
        leaders,
        records,
    })
}

fn schedule_row(team: &Team, game: &Game, teams: &Directory<'_, Team>) -> Option<ScheduleRow> {
    let (home, opp_ref) = if matches_ref(team, &game.home_team) {
        (true, &game.away_team)
    } else if matches_ref(team, &game.away_team) {
        (false, &game.home_team)
    } else {
        return None;
    };
    let score = game
        .score()
        .map(|(h, a)| if home { (h, a) } else { (a, h) });
    Some(ScheduleRow {
        game_id: game.id.clone(),
        date: game.date.clone(),
        home,
        opponent: teams.label(opp_ref),
        score,
    })
}

impl fmt::Display for TeamPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.team.name)?;
        if let Some(alt) = &self.team.alt_name {
            write!(f, " ({alt})")?;
        }
        writeln!(f)?;
        let season = self.season.as_deref().unwrap_or("all seasons");
        writeln!(f, "{season} · {}\n", self.kind)?;

        writeln!(f, "Roster")?;
        if self.roster.is_empty() {
            writeln!(f, "  No players on file.")?;
        }
        for p in &self.roster {
            writeln!(
                f,
                "  #{:<3} {:<24} {}",
                p.number.as_deref().unwrap_or("-"),
                p.name,
                p.position.as_deref().unwrap_or("")
            )?;
        }

        writeln!(f, "\nSchedule")?;
        if self.schedule.is_empty() {
            writeln!(f, "  No games on file.")?;
        }
        for g in &self.schedule {
            let venue = if g.home { "vs" } else { "@" };
            let score = match g.score {
                Some((us, them)) => {
                    let result = match us.cmp(&them) {
                        std::cmp::Ordering::Greater => "W",
                        std::cmp::Ordering::Less => "L",
                        std::cmp::Ordering::Equal => "T",
                    };
                    format!("{result} {us}-{them}")
                }
                None => "-".to_owned(),
            };
            writeln!(f, "  {:<10} {venue:<2} {:<24} {score}", g.date, g.opponent)?;
        }

        write_boards(f, "Leaders (per game)", self.leaders.as_deref())?;
        write_boards(f, "Single-game records", self.records.as_deref())
    }
}

fn write_boards(f: &mut fmt::Formatter<'_>, title: &str, boards: Option<&[Board]>) -> fmt::Result {
    writeln!(f, "\n{title}")?;
    let Some(boards) = boards else {
        return writeln!(f, "  No data for this season.");
    };
    for board in boards.iter().filter(|b| !b.rows.is_empty()) {
        writeln!(f, "  {}", board.category.to_uppercase())?;
        for (rank, row) in board.rows.iter().enumerate() {
            write!(f, "    {}. {:<24} {:>6}", rank + 1, row.player, stat(row.value))?;
            if let Some(date) = &row.date {
                write!(f, "  {date}")?;
            }
            if let Some(opp) = &row.opp {
                write!(f, " vs {opp}")?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Player page
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlayerPage {
    pub player: Player,
    pub teams: Vec<String>,
    pub current: Option<SeasonLine>,
    pub history: Vec<SeasonLine>,
    pub log: Vec<LogRow>,
    /// Games whose boxscore wasn't available; the log may be incomplete.
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct SeasonLine {
    pub season: String,
    pub kind: CompetitionType,
    pub games: u32,
    pub pts: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
}

impl From<&SeasonTotals> for SeasonLine {
    fn from(t: &SeasonTotals) -> Self {
        Self {
            season: t.season.clone(),
            kind: t.kind,
            games: t.games,
            pts: t.average("pts"),
            reb: t.average("reb"),
            ast: t.average("ast"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogRow {
    pub game_id: String,
    pub date: String,
    pub kind: CompetitionType,
    pub team: String,
    pub opp: String,
    pub result: Option<char>,
    pub stats: StatLine,
}

pub async fn player_page<S: DataSource>(store: &DataStore<S>, player_ref: &str) -> Option<PlayerPage> {
    let players = store.players().await;
    let player = resolve_player(player_ref, &players)?.clone();

    let teams = store.teams().await;
    let totals = store.player_totals().await;
    let games = store.games().await;

    let directory = Directory::new(&teams);
    let log = build_game_log(store, &player.id, &games).await;

    Some(PlayerPage {
        teams: player.teams.iter().map(|t| directory.label(t)).collect(),
        current: current_season_totals(&player.id, &totals).map(SeasonLine::from),
        history: season_history(&player.id, &totals)
            .into_iter()
            .map(SeasonLine::from)
            .collect(),
        log: log
            .entries
            .into_iter()
            .map(|e| LogRow {
                result: e.result(),
                team: directory.label(&e.team),
                opp: directory.label(&e.opp),
                game_id: e.game_id,
                date: e.date,
                kind: e.kind,
                stats: e.stats,
            })
            .collect(),
        skipped: log.skipped,
        player,
    })
}

impl fmt::Display for PlayerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(number) = &self.player.number {
            write!(f, "#{number} ")?;
        }
        write!(f, "{}", self.player.name)?;
        if let Some(position) = &self.player.position {
            write!(f, " · {position}")?;
        }
        writeln!(f)?;
        if !self.teams.is_empty() {
            writeln!(f, "{}", self.teams.join(", "))?;
        }

        match &self.current {
            Some(c) => writeln!(
                f,
                "\n{} {}: {} GP, {} PPG, {} RPG, {} APG",
                c.season,
                c.kind,
                c.games,
                avg(c.pts),
                avg(c.reb),
                avg(c.ast)
            )?,
            None => writeln!(f, "\nNo season averages on file.")?,
        }

        if self.history.len() > 1 {
            writeln!(f, "\n{:<10} {:<10} {:>3} {:>6} {:>6} {:>6}", "SEASON", "TYPE", "GP", "PTS", "REB", "AST")?;
            for s in &self.history {
                writeln!(
                    f,
                    "{:<10} {:<10} {:>3} {:>6} {:>6} {:>6}",
                    s.season,
                    s.kind.label(),
                    s.games,
                    avg(s.pts),
                    avg(s.reb),
                    avg(s.ast)
                )?;
            }
        }

        writeln!(f, "\nGame log")?;
        if self.log.is_empty() {
            writeln!(f, "  No games on file.")?;
        }
        for row in &self.log {
            writeln!(
                f,
                "  {:<10} {:<20} {} {:>4} {:>4} {:>4} {:>4} {:>4}",
                row.date,
                row.opp,
                row.result.unwrap_or(' '),
                stat_or_dash(row.stats.pts),
                stat_or_dash(row.stats.reb),
                stat_or_dash(row.stats.ast),
                stat_or_dash(row.stats.stl),
                stat_or_dash(row.stats.blk)
            )?;
        }
        if self.skipped > 0 {
            writeln!(f, "  ({} game(s) without a boxscore not shown)", self.skipped)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Game page
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GamePage {
    pub game: Game,
    pub home: String,
    pub away: String,
    /// `None` when the boxscore couldn't be loaded.
    pub sheets: Option<Vec<TeamSheet>>,
}

#[derive(Debug, Serialize)]
pub struct TeamSheet {
    pub team: String,
    pub lines: Vec<SheetLine>,
    pub totals: Option<StatLine>,
}

#[derive(Debug, Serialize)]
pub struct SheetLine {
    pub player: String,
    pub number: Option<String>,
    pub stats: StatLine,
}

pub async fn game_page<S: DataSource>(store: &DataStore<S>, game_id: &str) -> Option<GamePage> {
    let games = store.games().await;
    let game = games.iter().find(|g| g.id == game_id)?.clone();

    let teams = store.teams().await;
    let players = store.players().await;
    let team_directory = Directory::new(&teams);
    let player_directory = Directory::new(&players);

    let sheets = match store.boxscore(&game).await {
        Ok(sheet) if sheet.has_breakdown() => {
            let home = team_directory.canonical_id(&game.home_team);
            let away = team_directory.canonical_id(&game.away_team);
            let mut ordered = sheet.team_blocks();
            ordered.sort_by_key(|(key, _)| {
                let id = team_directory.canonical_id(key);
                if id == home {
                    0
                } else if id == away {
                    1
                } else {
                    2
                }
            });
            let blocks = ordered
                .into_iter()
                .map(|(key, lines)| TeamSheet {
                    team: team_directory.label(key),
                    lines: lines
                        .iter()
                        .map(|p| SheetLine {
                            player: p
                                .name
                                .clone()
                                .unwrap_or_else(|| player_directory.label(&p.player_id)),
                            number: p.number.clone(),
                            stats: p.stats.clone().with_combined_rebounds(),
                        })
                        .collect(),
                    totals: sheet
                        .teams
                        .get(key)
                        .and_then(|b| b.totals.clone())
                        .or_else(|| sheet.team_totals.clone()),
                })
                .collect();
            Some(blocks)
        }
        Ok(_) => None,
        Err(e) => {
            log::info!("no boxscore for {game_id}: {e}");
            None
        }
    };

    Some(GamePage {
        home: team_directory.label(&game.home_team),
        away: team_directory.label(&game.away_team),
        game,
        sheets,
    })
}

impl fmt::Display for GamePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.game.score() {
            Some((h, a)) => writeln!(f, "{} {h}-{a} {}", self.home, self.away)?,
            None => writeln!(f, "{} vs {}", self.home, self.away)?,
        }
        writeln!(f, "{} · {} {}", self.game.date, self.game.season, self.game.kind)?;

        let Some(sheets) = &self.sheets else {
            return writeln!(f, "\nBoxscore not available.");
        };
        for sheet in sheets {
            writeln!(f, "\n{}", sheet.team)?;
            writeln!(
                f,
                "  {:<24} {:>4} {:>4} {:>4} {:>4} {:>4} {:>7} {:>7} {:>7}",
                "PLAYER", "PTS", "REB", "AST", "STL", "BLK", "FG", "3P", "FT"
            )?;
            for line in &sheet.lines {
                let name = match &line.number {
                    Some(n) => format!("#{n} {}", line.player),
                    None => line.player.clone(),
                };
                write_sheet_row(f, &name, &line.stats)?;
            }
            if let Some(totals) = &sheet.totals {
                write_sheet_row(f, "TOTALS", &totals.clone().with_combined_rebounds())?;
            }
        }
        Ok(())
    }
}

fn write_sheet_row(f: &mut fmt::Formatter<'_>, name: &str, s: &StatLine) -> fmt::Result {
    writeln!(
        f,
        "  {:<24} {:>4} {:>4} {:>4} {:>4} {:>4} {:>7} {:>7} {:>7}",
        name,
        stat_or_dash(s.pts),
        stat_or_dash(s.reb),
        stat_or_dash(s.ast),
        stat_or_dash(s.stl),
        stat_or_dash(s.blk),
        made_attempted(s.fgm, s.fga),
        made_attempted(s.fg3m, s.fg3a),
        made_attempted(s.ftm, s.fta)
    )
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Whole numbers without decimals, anything else to one place.
fn stat(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v:.1}") }
}

fn stat_or_dash(v: Option<f64>) -> String {
    v.map(stat).unwrap_or_else(|| "-".to_owned())
}

fn avg(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_owned())
}

fn made_attempted(made: Option<f64>, attempted: Option<f64>) -> String {
    match (made, attempted) {
        (None, None) => "-".to_owned(),
        (m, a) => format!("{}-{}", stat(m.unwrap_or(0.0)), stat(a.unwrap_or(0.0))),
    }
}
