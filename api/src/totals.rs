use crate::{CompetitionType, SeasonTotals};
use log::debug;

/// The season a player page should headline.
///
/// Among the player's regular-season entries the greatest season label wins,
/// compared as plain strings. That is right for `"2024"` and `"2024-25"` style
/// labels but not in general, so labels of any other shape are logged.
/// Without a regular-season entry, the player's first entry of any type.
pub fn current_season_totals<'a>(
    player_id: &str,
    all: &'a [SeasonTotals],
) -> Option<&'a SeasonTotals> {
    let mine = move || all.iter().filter(move |t| t.player_id == player_id);

    let best_regular = mine()
        .filter(|t| t.kind == CompetitionType::Regular)
        .inspect(|t| {
            if !is_year_label(&t.season) {
                debug!(
                    "season label '{}' for {player_id} may not order correctly as a string",
                    t.season
                );
            }
        })
        .fold(None, |best: Option<&'a SeasonTotals>, t| match best {
            Some(b) if t.season <= b.season => Some(b),
            _ => Some(t),
        });

    best_regular.or_else(|| mine().next())
}

/// All of a player's entries: newest season first, then regular, playoff,
/// preseason within a season.
pub fn season_history<'a>(player_id: &str, all: &'a [SeasonTotals]) -> Vec<&'a SeasonTotals> {
    let mut history: Vec<&SeasonTotals> = all.iter().filter(|t| t.player_id == player_id).collect();
    history.sort_by(|a, b| {
        b.season
            .cmp(&a.season)
            .then_with(|| a.kind.cmp(&b.kind))
    });
    history
}

/// `YYYY`, `YYYY-YY` or `YYYY-YYYY`.
fn is_year_label(label: &str) -> bool {
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    match label.split_once('-') {
        None => digits(label, 4),
        Some((start, end)) => digits(start, 4) && (digits(end, 2) || digits(end, 4)),
    }
}
