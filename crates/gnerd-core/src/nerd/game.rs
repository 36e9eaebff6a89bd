// Game score assembler: per-game gNERD, slate ranking, and description
// attachment for the top of the ranking.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GameScoring;
use crate::describe::{Description, DescriptionSource, DescriptionState, GameFacts};
use crate::error::ScoreError;
use crate::nerd::pitcher::{PitcherNerdStats, PitcherScores};
use crate::nerd::team::{TeamNerdStats, TeamScores};

// ---------------------------------------------------------------------------
// Schedule input
// ---------------------------------------------------------------------------

/// One scheduled game. Starters are `None` (or "TBD") until announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub away_team: String,
    pub home_team: String,
    #[serde(default)]
    pub game_date: Option<NaiveDate>,
    #[serde(default)]
    pub game_time: Option<NaiveTime>,
    #[serde(default)]
    pub away_starter: Option<String>,
    #[serde(default)]
    pub home_starter: Option<String>,
}

fn announced(starter: &Option<String>) -> Option<&str> {
    starter
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("TBD"))
}

// ---------------------------------------------------------------------------
// Scored games
// ---------------------------------------------------------------------------

/// A starting pitcher slot in a scored game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StarterScore<'a> {
    Unannounced,
    /// Announced, but outside the qualifying population.
    NoData { name: &'a str },
    Scored { stats: &'a PitcherNerdStats },
}

impl<'a> StarterScore<'a> {
    fn resolve(starter: &'a Option<String>, pitchers: &'a PitcherScores) -> Self {
        match announced(starter) {
            None => StarterScore::Unannounced,
            Some(name) => match pitchers.lookup(name) {
                Some(stats) => StarterScore::Scored { stats },
                None => {
                    warn!(pitcher = name, "no qualifying statistics for starter");
                    StarterScore::NoData { name }
                }
            },
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match *self {
            StarterScore::Unannounced => None,
            StarterScore::NoData { name } => Some(name),
            StarterScore::Scored { stats } => Some(stats.name.as_str()),
        }
    }

    pub fn stats(&self) -> Option<&'a PitcherNerdStats> {
        match *self {
            StarterScore::Scored { stats } => Some(stats),
            _ => None,
        }
    }

    /// The pitcher's own pNERD; `None` when there is no data.
    pub fn pnerd(&self) -> Option<f64> {
        self.stats().map(|s| s.pnerd)
    }

    /// Value used inside the game average, substituting for missing data.
    pub fn contribution(&self, cfg: &GameScoring) -> f64 {
        self.pnerd().unwrap_or(cfg.missing_pitcher_substitute)
    }
}

/// A game with its scores fixed. Holds shared references to the pitcher and
/// team records it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGame<'a> {
    pub away_team_name: &'a str,
    pub home_team_name: &'a str,
    pub game_date: Option<NaiveDate>,
    pub game_time: Option<NaiveTime>,
    pub away_team: &'a TeamNerdStats,
    pub home_team: &'a TeamNerdStats,
    pub away_starter: StarterScore<'a>,
    pub home_starter: StarterScore<'a>,
    pub pnerd_average: f64,
    pub tnerd_average: f64,
    pub gnerd: f64,
}

/// Build the scored record for one scheduled game.
pub fn score_game<'a>(
    game: &'a ScheduledGame,
    pitchers: &'a PitcherScores,
    teams: &'a TeamScores,
    cfg: &GameScoring,
) -> Result<ScoredGame<'a>, ScoreError> {
    let away_team = lookup_team(teams, &game.away_team)?;
    let home_team = lookup_team(teams, &game.home_team)?;

    let away_starter = StarterScore::resolve(&game.away_starter, pitchers);
    let home_starter = StarterScore::resolve(&game.home_starter, pitchers);

    let pnerd_average = (away_starter.contribution(cfg) + home_starter.contribution(cfg)) / 2.0;
    let tnerd_average = (away_team.tnerd + home_team.tnerd) / 2.0;
    let gnerd = pnerd_average + tnerd_average;
    debug!(
        away = %game.away_team,
        home = %game.home_team,
        pnerd_average,
        tnerd_average,
        gnerd,
        "scored game"
    );

    Ok(ScoredGame {
        away_team_name: &game.away_team,
        home_team_name: &game.home_team,
        game_date: game.game_date,
        game_time: game.game_time,
        away_team,
        home_team,
        away_starter,
        home_starter,
        pnerd_average,
        tnerd_average,
        gnerd,
    })
}

fn lookup_team<'a>(teams: &'a TeamScores, name: &str) -> Result<&'a TeamNerdStats, ScoreError> {
    teams.lookup(name).ok_or_else(|| ScoreError::UnknownTeam {
        team: name.to_string(),
    })
}

/// Ranking order: gNERD descending, then earlier start time (unknown last),
/// then away team, then home team.
pub fn rank_order(a: &ScoredGame<'_>, b: &ScoredGame<'_>) -> Ordering {
    b.gnerd
        .total_cmp(&a.gnerd)
        .then_with(|| match (a.game_time, b.game_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.away_team_name.cmp(b.away_team_name))
        .then_with(|| a.home_team_name.cmp(b.home_team_name))
}

// ---------------------------------------------------------------------------
// Slate
// ---------------------------------------------------------------------------

/// Min/max/mean of a score across the day's slate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ScoreRange {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        let values: Vec<f64> = values.collect();
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, max, mean })
    }
}

/// Summary statistics of the day's scores, used as generator context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlateSummary {
    pub games: usize,
    pub gnerd: ScoreRange,
    pub tnerd_average: ScoreRange,
    pub pnerd_average: ScoreRange,
}

/// All scored games for one day, in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSlate<'a> {
    games: Vec<ScoredGame<'a>>,
}

/// A ranked game after the description step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribedGame<'a> {
    #[serde(flatten)]
    pub game: ScoredGame<'a>,
    pub description: DescriptionState,
}

impl<'a> RankedSlate<'a> {
    pub fn games(&self) -> &[ScoredGame<'a>] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn summary(&self) -> Option<SlateSummary> {
        Some(SlateSummary {
            games: self.games.len(),
            gnerd: ScoreRange::over(self.games.iter().map(|g| g.gnerd))?,
            tnerd_average: ScoreRange::over(self.games.iter().map(|g| g.tnerd_average))?,
            pnerd_average: ScoreRange::over(self.games.iter().map(|g| g.pnerd_average))?,
        })
    }

    /// Every game with its description left unset.
    pub fn without_descriptions(self) -> Vec<DescribedGame<'a>> {
        self.games
            .into_iter()
            .map(|game| DescribedGame {
                game,
                description: DescriptionState::Unset,
            })
            .collect()
    }

    /// Describe the first `limit` games in rank order; the rest stay unset.
    ///
    /// Generator calls are made one at a time. A failed call marks that game
    /// `Failed` and the remaining games are still processed.
    pub async fn attach_descriptions(
        self,
        limit: usize,
        source: DescriptionSource<'_>,
    ) -> Vec<DescribedGame<'a>> {
        let summary = self.summary();
        let selected = limit.min(self.games.len());
        info!(games = self.games.len(), selected, "attaching descriptions");

        let mut described = Vec::with_capacity(self.games.len());
        for (rank, game) in self.games.into_iter().enumerate() {
            let description = if rank >= limit {
                DescriptionState::Unset
            } else {
                match &source {
                    DescriptionSource::Placeholder(text) => {
                        DescriptionState::Described(Description {
                            text: text.clone(),
                            sources: Vec::new(),
                        })
                    }
                    DescriptionSource::Generator(describer) => {
                        let facts = GameFacts::from_game(&game, rank, summary);
                        match describer.describe(&facts).await {
                            Ok(d) => DescriptionState::Described(d),
                            Err(e) => {
                                warn!(
                                    away = game.away_team_name,
                                    home = game.home_team_name,
                                    error = %e,
                                    "description generation failed"
                                );
                                DescriptionState::Failed {
                                    reason: e.to_string(),
                                }
                            }
                        }
                    }
                }
            };
            described.push(DescribedGame { game, description });
        }
        described
    }
}

/// Score every scheduled game and sort the slate into rank order.
///
/// Missing pitchers never abort the slate; an unknown team does.
pub fn rank_slate<'a>(
    schedule: &'a [ScheduledGame],
    pitchers: &'a PitcherScores,
    teams: &'a TeamScores,
    cfg: &GameScoring,
) -> Result<RankedSlate<'a>, ScoreError> {
    let mut games = schedule
        .iter()
        .map(|g| score_game(g, pitchers, teams, cfg))
        .collect::<Result<Vec<_>, _>>()?;
    games.sort_by(rank_order);
    info!(games = games.len(), "ranked slate");
    Ok(RankedSlate { games })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
