use crate::source::DataSource;
use crate::store::DataStore;
use crate::{Boxscore, Game, GameLog, PlayerGameLogEntry};
use chrono::NaiveDate;
use futures_util::{StreamExt, stream};
use log::debug;
use std::cmp::Reverse;

/// Boxscore fetches allowed in flight at once while assembling a log.
const MAX_IN_FLIGHT: usize = 8;

/// Calendar date of a game. Accepts `2024-01-05`, `2024-1-5`, `05/01/2024`
/// (day first, as the ingest tool's input) and full RFC 3339 timestamps.
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Every game `player_id` appears in, newest first.
///
/// Games whose boxscore can't be fetched or parsed, or that has no per-team
/// player lists, are left out and counted in [`GameLog::skipped`].
pub async fn build_game_log<S: DataSource>(
    store: &DataStore<S>,
    player_id: &str,
    games: &[Game],
) -> GameLog {
    let (sheets, skipped) = load_boxscores(store, games).await;

    let mut entries: Vec<PlayerGameLogEntry> = sheets
        .iter()
        .flat_map(|(i, sheet)| assemble_entries(player_id, &games[*i], sheet))
        .collect();
    sort_newest_first(&mut entries);

    debug!(
        "game log for {player_id}: {} entries from {} games ({skipped} skipped)",
        entries.len(),
        games.len()
    );
    GameLog { entries, skipped }
}

/// Log entries for `player_id` from one game's boxscore. Normally zero or one.
pub fn assemble_entries(player_id: &str, game: &Game, sheet: &Boxscore) -> Vec<PlayerGameLogEntry> {
    let mut entries = Vec::new();
    for (team_key, players) in sheet.team_blocks() {
        let at_home = team_key == game.home_team;
        let (opp, team_score, opp_score) = if at_home {
            (&game.away_team, game.home_score, game.away_score)
        } else {
            (&game.home_team, game.away_score, game.home_score)
        };

        for line in players.iter().filter(|p| p.player_id == player_id) {
            entries.push(PlayerGameLogEntry {
                game_id: game.id.clone(),
                date: game.date.clone(),
                season: game.season.clone(),
                kind: game.kind,
                team: team_key.to_owned(),
                opp: opp.clone(),
                team_score,
                opp_score,
                stats: line.stats.clone().with_combined_rebounds(),
            });
        }
    }
    entries
}

/// Descending calendar date; undated entries last; ties keep their order.
pub fn sort_newest_first(entries: &mut [PlayerGameLogEntry]) {
    entries.sort_by_cached_key(|e| Reverse(parse_game_date(&e.date)));
}

/// Fetch every game's boxscore concurrently.
///
/// Returns the usable sheets tagged with their game's index (in index order,
/// whatever order the fetches finished in) and the number of games skipped.
pub(crate) async fn load_boxscores<S: DataSource>(
    store: &DataStore<S>,
    games: &[Game],
) -> (Vec<(usize, Boxscore)>, usize) {
    let mut sheets: Vec<(usize, Boxscore)> = Vec::with_capacity(games.len());
    let mut skipped = 0;

    let mut pending = stream::iter(games.iter().enumerate())
        .map(|(i, game)| async move { (i, store.boxscore(game).await) })
        .buffer_unordered(MAX_IN_FLIGHT);

    while let Some((i, result)) = pending.next().await {
        match result {
            Ok(sheet) if sheet.has_breakdown() => sheets.push((i, sheet)),
            Ok(_) => {
                debug!("boxscore for game {} has no player breakdown, skipping", games[i].id);
                skipped += 1;
            }
            Err(e) => {
                debug!("boxscore for game {} unavailable, skipping: {e}", games[i].id);
                skipped += 1;
            }
        }
    }

    sheets.sort_by_key(|(i, _)| *i);
    (sheets, skipped)
}
