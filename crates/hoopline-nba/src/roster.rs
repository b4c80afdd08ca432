//! Active-player filter for the all-players table

use hoopline_core::FetchError;
use hoopline_store::RecordSet;
use serde_json::Value;

pub const PERSON_ID_COLUMN: &str = "PERSON_ID";
const FROM_YEAR_COLUMN: &str = "FROM_YEAR";
const TO_YEAR_COLUMN: &str = "TO_YEAR";

/// Year cells come back as strings ("1996") or numbers depending on endpoint.
fn year_of(cell: Option<&Value>) -> Option<i32> {
    match cell? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

/// Keep players whose career span covers `year`.
///
/// A table without the year columns is treated as a malformed response.
pub fn active_players(mut players: RecordSet, year: i32) -> Result<RecordSet, FetchError> {
    let (Some(from), Some(to)) = (
        players.column_index(FROM_YEAR_COLUMN),
        players.column_index(TO_YEAR_COLUMN),
    ) else {
        return Err(FetchError::decode(format!(
            "{} has no {FROM_YEAR_COLUMN}/{TO_YEAR_COLUMN} columns",
            players.name
        )));
    };

    let before = players.len();
    players.retain_rows(|row| {
        matches!(
            (year_of(row.get(from)), year_of(row.get(to))),
            (Some(f), Some(t)) if f <= year && year <= t
        )
    });
    log::info!("{} of {before} players active in {year}", players.len());
    Ok(players)
}
