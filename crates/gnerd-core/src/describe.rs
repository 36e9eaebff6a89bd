// Description seam: the fact set handed to a text generator, the generator
// trait, and the per-game description state.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::DescriptionError;
use crate::nerd::game::{ScoredGame, SlateSummary, StarterScore};
use crate::nerd::pitcher::PitcherNerdStats;
use crate::nerd::team::TeamNerdStats;

/// A source the generator cited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_text: Option<String>,
}

/// Generated text plus its sources (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub text: String,
    pub sources: Vec<Citation>,
}

/// Description status of one ranked game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DescriptionState {
    Unset,
    Described(Description),
    Failed { reason: String },
}

impl DescriptionState {
    pub fn description(&self) -> Option<&Description> {
        match self {
            DescriptionState::Described(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, DescriptionState::Described(_))
    }
}

/// External text generator.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, facts: &GameFacts) -> Result<Description, DescriptionError>;
}

/// Where attached descriptions come from.
pub enum DescriptionSource<'d> {
    /// The same fixed text for every selected game.
    Placeholder(String),
    /// Delegate to a generator, one call per selected game.
    Generator(&'d dyn Describer),
}

// ---------------------------------------------------------------------------
// Fact set
// ---------------------------------------------------------------------------

/// One named component value, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentFact {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamFacts {
    pub name: String,
    pub tnerd: f64,
    pub components: Vec<ComponentFact>,
}

impl TeamFacts {
    fn from_stats(stats: &TeamNerdStats) -> Self {
        Self {
            name: stats.name.clone(),
            tnerd: stats.tnerd,
            components: stats
                .components
                .named()
                .into_iter()
                .map(|(name, value)| ComponentFact { name, value })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarterFacts {
    /// `None` when no starter has been announced.
    pub name: Option<String>,
    /// `None` when the starter has no qualifying statistics.
    pub pnerd: Option<f64>,
    pub components: Vec<ComponentFact>,
}

impl StarterFacts {
    fn from_starter(starter: &StarterScore<'_>) -> Self {
        let components: Vec<ComponentFact> = starter
            .stats()
            .map(|s: &PitcherNerdStats| {
                s.components
                    .named()
                    .into_iter()
                    .map(|(name, value)| ComponentFact { name, value })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: starter.name().map(str::to_string),
            pnerd: starter.pnerd(),
            components,
        }
    }
}

/// Everything a generator needs to write about one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameFacts {
    pub away_team: TeamFacts,
    pub home_team: TeamFacts,
    pub away_starter: StarterFacts,
    pub home_starter: StarterFacts,
    pub game_date: Option<NaiveDate>,
    pub game_time: Option<NaiveTime>,
    pub pnerd_average: f64,
    pub tnerd_average: f64,
    pub gnerd: f64,
    /// Zero-based position in the ranked slate.
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slate: Option<SlateSummary>,
}

impl GameFacts {
    pub fn from_game(game: &ScoredGame<'_>, rank: usize, slate: Option<SlateSummary>) -> Self {
        Self {
            away_team: TeamFacts::from_stats(game.away_team),
            home_team: TeamFacts::from_stats(game.home_team),
            away_starter: StarterFacts::from_starter(&game.away_starter),
            home_starter: StarterFacts::from_starter(&game.home_starter),
            game_date: game.game_date,
            game_time: game.game_time,
            pnerd_average: game.pnerd_average,
            tnerd_average: game.tnerd_average,
            gnerd: game.gnerd,
            rank,
            slate,
        }
    }
}

/// "19:05" → "7:05 PM"; unknown times read "TBD".
pub fn format_time_12_hour(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hour_times() {
        assert_eq!(format_time_12_hour(None), "TBD");
        assert_eq!(format_time_12_hour(NaiveTime::from_hms_opt(13, 5, 0)), "1:05 PM");
        assert_eq!(format_time_12_hour(NaiveTime::from_hms_opt(0, 30, 0)), "12:30 AM");
    }
}
