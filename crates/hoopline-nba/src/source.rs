//! Fetch Client seam: one operation per entity kind

use hoopline_core::FetchError;
use hoopline_store::{EntityId, RecordSet};

use crate::period::PeriodWindow;
use crate::season::Season;

/// Remote source of NBA stats tables.
///
/// Each call returns the first result set of one request. Implementations
/// classify their own failures as [`FetchError`]; the runner retries all of
/// them alike.
pub trait StatsSource {
    /// Every player in league history; the pipeline filters to the season.
    fn all_players(&self, season: &Season) -> Result<RecordSet, FetchError>;

    fn player_game_log(&self, season: &Season, player_id: &EntityId)
        -> Result<RecordSet, FetchError>;

    /// All field goal attempts by the player in the season.
    fn shot_chart_detail(
        &self,
        season: &Season,
        player_id: &EntityId,
    ) -> Result<RecordSet, FetchError>;

    fn play_by_play(&self, game_id: &EntityId) -> Result<RecordSet, FetchError>;

    /// Advanced box score for the whole game.
    fn box_score_advanced(&self, game_id: &EntityId) -> Result<RecordSet, FetchError>;

    /// Advanced box score restricted to a game clock window.
    fn box_score_advanced_range(
        &self,
        game_id: &EntityId,
        window: PeriodWindow,
    ) -> Result<RecordSet, FetchError>;
}
