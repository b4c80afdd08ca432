//! stats.nba.com client

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use hoopline_core::{FetchError, build_client, get_text};
use hoopline_store::{EntityId, RecordSet};

use crate::config::ClientConfig;
use crate::period::PeriodWindow;
use crate::season::Season;
use crate::source::StatsSource;

const LEAGUE_ID: &str = "00";
const REGULAR_SEASON: &str = "Regular Season";

/// Blocking client for the stats endpoints the pipeline needs.
pub struct NbaStatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = build_client(config.timeout, stats_headers(&config.user_agent)?)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<RecordSet, FetchError> {
        let url = format!("{}{endpoint}", self.base_url);
        log::debug!("GET {url} {params:?}");
        let body = get_text(&self.client, &url, params)?;
        first_result_set(&body).map_err(|e| match e {
            FetchError::Decode(msg) => FetchError::Decode(format!("{endpoint}: {msg}")),
            other => other,
        })
    }
}

/// Headers the stats site expects from a browser.
fn stats_headers(user_agent: &str) -> Result<HeaderMap, FetchError> {
    let pairs = [
        ("user-agent", user_agent),
        ("accept", "application/json, text/plain, */*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("referer", "https://www.nba.com/"),
        ("origin", "https://www.nba.com"),
        ("pragma", "no-cache"),
        ("cache-control", "no-cache"),
        ("x-nba-stats-origin", "stats"),
        ("x-nba-stats-token", "true"),
    ];
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::decode(format!("bad {name} header: {e}")))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}

fn param(name: &'static str, value: impl ToString) -> (&'static str, String) {
    (name, value.to_string())
}

impl StatsSource for NbaStatsClient {
    fn all_players(&self, season: &Season) -> Result<RecordSet, FetchError> {
        self.get(
            "commonallplayers",
            &[
                param("LeagueID", LEAGUE_ID),
                param("Season", season.season_str()),
                param("IsOnlyCurrentSeason", 0),
            ],
        )
    }

    fn player_game_log(
        &self,
        season: &Season,
        player_id: &EntityId,
    ) -> Result<RecordSet, FetchError> {
        self.get(
            "playergamelog",
            &[
                param("PlayerID", player_id),
                param("Season", season.season_str()),
                param("SeasonType", REGULAR_SEASON),
                param("LeagueID", ""),
                param("DateFrom", ""),
                param("DateTo", ""),
            ],
        )
    }

    fn shot_chart_detail(
        &self,
        season: &Season,
        player_id: &EntityId,
    ) -> Result<RecordSet, FetchError> {
        // TeamID=0 means every team the player appeared for.
        self.get(
            "shotchartdetail",
            &[
                param("PlayerID", player_id),
                param("TeamID", 0),
                param("Season", season.season_str()),
                param("SeasonType", REGULAR_SEASON),
                param("ContextMeasure", "FGA"),
                param("LeagueID", LEAGUE_ID),
                param("LastNGames", 0),
                param("Month", 0),
                param("OpponentTeamID", 0),
                param("Period", 0),
                param("AheadBehind", ""),
                param("ClutchTime", ""),
                param("ContextFilter", ""),
                param("DateFrom", ""),
                param("DateTo", ""),
                param("EndPeriod", ""),
                param("EndRange", ""),
                param("GameID", ""),
                param("GameSegment", ""),
                param("Location", ""),
                param("Outcome", ""),
                param("PlayerPosition", ""),
                param("PointDiff", ""),
                param("Position", ""),
                param("RangeType", ""),
                param("RookieYear", ""),
                param("SeasonSegment", ""),
                param("StartPeriod", ""),
                param("StartRange", ""),
                param("VsConference", ""),
                param("VsDivision", ""),
            ],
        )
    }

    fn play_by_play(&self, game_id: &EntityId) -> Result<RecordSet, FetchError> {
        self.get(
            "playbyplayv2",
            &[
                param("GameID", game_id),
                param("StartPeriod", 0),
                param("EndPeriod", 0),
            ],
        )
    }

    fn box_score_advanced(&self, game_id: &EntityId) -> Result<RecordSet, FetchError> {
        self.get(
            "boxscoreadvancedv2",
            &[
                param("GameID", game_id),
                param("StartPeriod", 0),
                param("EndPeriod", 0),
                param("StartRange", 0),
                param("EndRange", 0),
                param("RangeType", 0),
            ],
        )
    }

    fn box_score_advanced_range(
        &self,
        game_id: &EntityId,
        window: PeriodWindow,
    ) -> Result<RecordSet, FetchError> {
        // RangeType=2 selects by game clock; the period bounds just need to
        // cover every possible overtime.
        self.get(
            "boxscoreadvancedv2",
            &[
                param("GameID", game_id),
                param("StartPeriod", 0),
                param("EndPeriod", 14),
                param("StartRange", window.start_range),
                param("EndRange", window.end_range),
                param("RangeType", 2),
            ],
        )
    }
}

#[derive(Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", alias = "resultSet")]
    result_sets: ResultSets,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultSets {
    Many(Vec<RawResultSet>),
    One(RawResultSet),
}

#[derive(Deserialize)]
struct RawResultSet {
    #[serde(default)]
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// Parse the first result set of a stats API response body.
pub fn first_result_set(body: &str) -> Result<RecordSet, FetchError> {
    let response: StatsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::decode(e.to_string()))?;
    let raw = match response.result_sets {
        ResultSets::One(raw) => raw,
        ResultSets::Many(sets) => sets
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::decode("empty resultSets"))?,
    };
    Ok(RecordSet::new(raw.name, raw.headers, raw.row_set))
}
