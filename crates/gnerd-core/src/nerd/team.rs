// Team score model (tNERD).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TeamScoring;
use crate::error::ScoreError;
use crate::nerd::population::{compute_pool_stats, compute_zscore, PoolStats};
use crate::teams::abbreviation_for;

/// Raw team statistics as supplied by the caller. Every field is required
/// for scoring; absence is surfaced by [`TeamStats::metrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub name: String,
    #[serde(default)]
    pub batting_runs: Option<f64>,
    #[serde(default)]
    pub barrel_rate: Option<f64>,
    #[serde(default)]
    pub baserunning_runs: Option<f64>,
    #[serde(default)]
    pub fielding_runs: Option<f64>,
    #[serde(default)]
    pub bullpen_runs: Option<f64>,
    #[serde(default)]
    pub payroll: Option<f64>,
    #[serde(default)]
    pub age: Option<f64>,
    /// wRC minus actual runs scored.
    #[serde(default)]
    pub luck: Option<f64>,
}

/// A team record with every field present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamMetrics {
    pub batting_runs: f64,
    pub barrel_rate: f64,
    pub baserunning_runs: f64,
    pub fielding_runs: f64,
    pub bullpen_runs: f64,
    pub payroll: f64,
    pub age: f64,
    pub luck: f64,
}

impl TeamStats {
    /// Validate that every field is present and finite.
    pub fn metrics(&self) -> Result<TeamMetrics, ScoreError> {
        let require = |value: Option<f64>, field: &'static str| {
            value
                .filter(|v| v.is_finite())
                .ok_or_else(|| ScoreError::IncompleteTeamRecord {
                    team: self.name.clone(),
                    field,
                })
        };
        Ok(TeamMetrics {
            batting_runs: require(self.batting_runs, "batting_runs")?,
            barrel_rate: require(self.barrel_rate, "barrel_rate")?,
            baserunning_runs: require(self.baserunning_runs, "baserunning_runs")?,
            fielding_runs: require(self.fielding_runs, "fielding_runs")?,
            bullpen_runs: require(self.bullpen_runs, "bullpen_runs")?,
            payroll: require(self.payroll, "payroll")?,
            age: require(self.age, "age")?,
            luck: require(self.luck, "luck")?,
        })
    }
}

/// League-wide pool statistics for every team metric.
#[derive(Debug, Clone, Serialize)]
pub struct TeamPopulation {
    pub batting_runs: PoolStats,
    pub barrel_rate: PoolStats,
    pub baserunning_runs: PoolStats,
    pub fielding_runs: PoolStats,
    pub bullpen_runs: PoolStats,
    pub payroll: PoolStats,
    pub age: PoolStats,
    pub luck: PoolStats,
}

impl TeamPopulation {
    pub fn from_metrics(league: &[TeamMetrics]) -> Self {
        let pool = |f: fn(&TeamMetrics) -> f64| {
            compute_pool_stats(&league.iter().map(f).collect::<Vec<_>>())
        };
        let population = Self {
            batting_runs: pool(|t| t.batting_runs),
            barrel_rate: pool(|t| t.barrel_rate),
            baserunning_runs: pool(|t| t.baserunning_runs),
            fielding_runs: pool(|t| t.fielding_runs),
            bullpen_runs: pool(|t| t.bullpen_runs),
            payroll: pool(|t| t.payroll),
            age: pool(|t| t.age),
            luck: pool(|t| t.luck),
        };
        population.warn_degenerate();
        population
    }

    fn pools(&self) -> [(&'static str, &PoolStats); 8] {
        [
            ("batting_runs", &self.batting_runs),
            ("barrel_rate", &self.barrel_rate),
            ("baserunning_runs", &self.baserunning_runs),
            ("fielding_runs", &self.fielding_runs),
            ("bullpen_runs", &self.bullpen_runs),
            ("payroll", &self.payroll),
            ("age", &self.age),
            ("luck", &self.luck),
        ]
    }

    fn warn_degenerate(&self) {
        for (metric, stats) in self.pools() {
            if stats.is_degenerate() {
                warn!(
                    metric,
                    samples = stats.count,
                    "team metric population cannot discriminate; z-scores collapse to 0"
                );
            }
        }
    }

    /// Names of the metrics whose population cannot discriminate.
    pub fn degenerate_metrics(&self) -> Vec<&'static str> {
        self.pools()
            .into_iter()
            .filter(|(_, stats)| stats.is_degenerate())
            .map(|(metric, _)| metric)
            .collect()
    }
}

/// Oriented z-scores: payroll and age are negated (cheaper and younger
/// are positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamZScores {
    pub batting_runs: f64,
    pub barrel_rate: f64,
    pub baserunning_runs: f64,
    pub fielding_runs: f64,
    pub bullpen_runs: f64,
    pub payroll: f64,
    pub age: f64,
    pub luck: f64,
}

/// Contributions to tNERD after the positive-only and cap rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamComponents {
    pub batting_runs: f64,
    pub barrel_rate: f64,
    pub baserunning_runs: f64,
    pub fielding_runs: f64,
    pub bullpen_runs: f64,
    pub payroll: f64,
    pub age: f64,
    pub luck: f64,
}

impl TeamComponents {
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("Batting Runs", self.batting_runs),
            ("Barrel%", self.barrel_rate),
            ("Baserunning", self.baserunning_runs),
            ("Fielding", self.fielding_runs),
            ("Bullpen", self.bullpen_runs),
            ("Payroll", self.payroll),
            ("Age", self.age),
            ("Luck", self.luck),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, v)| v).sum()
    }
}

/// A team's tNERD with its full breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamNerdStats {
    pub name: String,
    pub zscores: TeamZScores,
    pub components: TeamComponents,
    pub constant: f64,
    pub tnerd: f64,
}

pub fn team_zscores(metrics: &TeamMetrics, population: &TeamPopulation) -> TeamZScores {
    TeamZScores {
        batting_runs: compute_zscore(metrics.batting_runs, &population.batting_runs),
        barrel_rate: compute_zscore(metrics.barrel_rate, &population.barrel_rate),
        baserunning_runs: compute_zscore(metrics.baserunning_runs, &population.baserunning_runs),
        fielding_runs: compute_zscore(metrics.fielding_runs, &population.fielding_runs),
        bullpen_runs: compute_zscore(metrics.bullpen_runs, &population.bullpen_runs),
        payroll: -compute_zscore(metrics.payroll, &population.payroll),
        age: -compute_zscore(metrics.age, &population.age),
        luck: compute_zscore(metrics.luck, &population.luck),
    }
}

pub fn team_components(z: &TeamZScores, cfg: &TeamScoring) -> TeamComponents {
    TeamComponents {
        batting_runs: z.batting_runs,
        barrel_rate: z.barrel_rate,
        baserunning_runs: z.baserunning_runs,
        fielding_runs: z.fielding_runs,
        bullpen_runs: z.bullpen_runs,
        payroll: z.payroll.max(0.0),
        age: z.age.max(0.0),
        luck: z.luck.clamp(0.0, cfg.luck_cap),
    }
}

pub fn score_team(
    name: &str,
    metrics: &TeamMetrics,
    population: &TeamPopulation,
    cfg: &TeamScoring,
) -> TeamNerdStats {
    let zscores = team_zscores(metrics, population);
    let components = team_components(&zscores, cfg);
    let tnerd = components.sum() + cfg.constant;
    debug!(team = name, tnerd, "scored team");
    TeamNerdStats {
        name: name.to_string(),
        zscores,
        components,
        constant: cfg.constant,
        tnerd,
    }
}

/// Scored teams for one run.
#[derive(Debug, Clone, Default)]
pub struct TeamScores {
    by_name: HashMap<String, TeamNerdStats>,
}

impl TeamScores {
    /// Look up by registry key, falling back to the standard abbreviation of
    /// a full club name ("Boston Red Sox" → "BOS").
    pub fn lookup(&self, team: &str) -> Option<&TeamNerdStats> {
        let trimmed = team.trim();
        self.by_name
            .get(trimmed)
            .or_else(|| abbreviation_for(trimmed).and_then(|abbr| self.by_name.get(abbr)))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamNerdStats> {
        self.by_name.values()
    }
}

/// Validate and score every team against the full league population.
///
/// An incomplete record is a data-integrity failure and aborts the run.
pub fn score_teams(league: &[TeamStats], cfg: &TeamScoring) -> Result<TeamScores, ScoreError> {
    if league.is_empty() {
        return Err(ScoreError::EmptyPopulation { role: "team" });
    }
    let metrics = league
        .iter()
        .map(TeamStats::metrics)
        .collect::<Result<Vec<_>, _>>()?;
    info!(teams = league.len(), "building team population");

    let population = TeamPopulation::from_metrics(&metrics);
    let mut scores = TeamScores::default();
    for (team, m) in league.iter().zip(&metrics) {
        let name = team.name.trim();
        if scores.by_name.contains_key(name) {
            warn!(team = name, "duplicate team record, keeping the latest");
        }
        scores
            .by_name
            .insert(name.to_string(), score_team(name, m, &population, cfg));
    }
    Ok(scores)
}
