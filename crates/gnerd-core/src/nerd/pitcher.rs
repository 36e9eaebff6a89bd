// Pitcher score model (pNERD).
//
// Orientation: every z-score stored on `PitcherNerdStats` is already flipped
// so that positive means "more watchable". xFIP-, age and pace are
// lower-is-better and are negated before weighting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PitcherScoring;
use crate::nerd::population::{zscore_opt, PoolStats};
use crate::teams::normalize_person_name;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Season statistics for one starting pitcher. Any numeric field may be
/// absent when the provider has no qualifying sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherStats {
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub innings_pitched: Option<f64>,
    #[serde(default)]
    pub games_started: Option<u32>,
    #[serde(default)]
    pub xfip_minus: Option<f64>,
    #[serde(default)]
    pub swinging_strike_rate: Option<f64>,
    /// Direct strike rate; when absent it is derived from `strikes / pitches`.
    #[serde(default)]
    pub strike_rate: Option<f64>,
    #[serde(default)]
    pub strikes: Option<u32>,
    #[serde(default)]
    pub pitches: Option<u32>,
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub age: Option<f64>,
    /// Seconds between pitches.
    #[serde(default)]
    pub pace: Option<f64>,
    /// ERA- minus xFIP-.
    #[serde(default)]
    pub era_minus_xfip_minus: Option<f64>,
    #[serde(default)]
    pub knuckleball_rate: Option<f64>,
}

impl PitcherStats {
    /// Strike rate, falling back to the strikes/pitches ratio. Null when
    /// neither is available or the pitch count is zero.
    pub fn effective_strike_rate(&self) -> Option<f64> {
        if self.strike_rate.is_some() {
            return self.strike_rate;
        }
        match (self.strikes, self.pitches) {
            (Some(strikes), Some(pitches)) if pitches > 0 => {
                Some(strikes as f64 / pitches as f64)
            }
            _ => None,
        }
    }

    /// Whether this pitcher belongs to the qualifying starter population.
    pub fn qualifies(&self, cfg: &PitcherScoring) -> bool {
        let enough_innings = self
            .innings_pitched
            .is_some_and(|ip| ip >= cfg.min_innings);
        let has_started = self.games_started.map_or(true, |gs| gs >= 1);
        enough_innings && has_started
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Pool statistics for every z-scored pitcher metric.
#[derive(Debug, Clone, Serialize)]
pub struct PitcherPopulation {
    pub xfip_minus: PoolStats,
    pub swinging_strike_rate: PoolStats,
    pub strike_rate: PoolStats,
    pub velocity: PoolStats,
    pub age: PoolStats,
    pub pace: PoolStats,
}

impl PitcherPopulation {
    /// Compute pool stats over the given (already qualified) starters.
    pub fn from_pitchers(pool: &[&PitcherStats]) -> Self {
        let population = Self {
            xfip_minus: PoolStats::from_optional(pool.iter().map(|p| p.xfip_minus)),
            swinging_strike_rate: PoolStats::from_optional(
                pool.iter().map(|p| p.swinging_strike_rate),
            ),
            strike_rate: PoolStats::from_optional(
                pool.iter().map(|p| p.effective_strike_rate()),
            ),
            velocity: PoolStats::from_optional(pool.iter().map(|p| p.velocity)),
            age: PoolStats::from_optional(pool.iter().map(|p| p.age)),
            pace: PoolStats::from_optional(pool.iter().map(|p| p.pace)),
        };
        population.warn_degenerate();
        population
    }

    fn warn_degenerate(&self) {
        let metrics = [
            ("xfip_minus", &self.xfip_minus),
            ("swinging_strike_rate", &self.swinging_strike_rate),
            ("strike_rate", &self.strike_rate),
            ("velocity", &self.velocity),
            ("age", &self.age),
            ("pace", &self.pace),
        ];
        for (metric, stats) in metrics {
            if stats.is_degenerate() {
                warn!(
                    metric,
                    samples = stats.count,
                    "pitcher metric population cannot discriminate; z-scores collapse to 0"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Derived scores
// ---------------------------------------------------------------------------

/// Oriented z-scores (positive = more watchable). `None` where the raw value
/// was missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitcherZScores {
    pub xfip_minus: Option<f64>,
    pub swinging_strike_rate: Option<f64>,
    pub strike_rate: Option<f64>,
    pub velocity: Option<f64>,
    pub age: Option<f64>,
    pub pace: Option<f64>,
}

/// Weighted, capped contributions to pNERD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitcherComponents {
    pub xfip_minus: f64,
    pub swinging_strike: f64,
    pub strike: f64,
    pub velocity: f64,
    pub age: f64,
    pub pace: f64,
    pub luck: f64,
    pub knuckleball: f64,
}

impl PitcherComponents {
    /// Components in display order, paired with their names.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("xFIP-", self.xfip_minus),
            ("SwStr%", self.swinging_strike),
            ("Strike%", self.strike),
            ("Velocity", self.velocity),
            ("Age", self.age),
            ("Pace", self.pace),
            ("Luck", self.luck),
            ("KN%", self.knuckleball),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, v)| v).sum()
    }
}

/// A pitcher's pNERD with its full breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitcherNerdStats {
    pub name: String,
    pub team: String,
    pub zscores: PitcherZScores,
    pub components: PitcherComponents,
    pub constant: f64,
    pub pnerd: f64,
}

/// Score one pitcher against the qualified-starter population.
pub fn score_pitcher(
    stats: &PitcherStats,
    population: &PitcherPopulation,
    cfg: &PitcherScoring,
) -> PitcherNerdStats {
    let negate = |z: Option<f64>| z.map(|v| -v);
    let zscores = PitcherZScores {
        xfip_minus: negate(zscore_opt(stats.xfip_minus, &population.xfip_minus)),
        swinging_strike_rate: zscore_opt(
            stats.swinging_strike_rate,
            &population.swinging_strike_rate,
        ),
        strike_rate: zscore_opt(stats.effective_strike_rate(), &population.strike_rate),
        velocity: zscore_opt(stats.velocity, &population.velocity),
        age: negate(zscore_opt(stats.age, &population.age)),
        pace: negate(zscore_opt(stats.pace, &population.pace)),
    };

    let components = pitcher_components(&zscores, stats, cfg);
    let pnerd = components.sum() + cfg.constant;
    debug!(pitcher = %stats.name, pnerd, "scored pitcher");

    PitcherNerdStats {
        name: stats.name.clone(),
        team: stats.team.clone(),
        zscores,
        components,
        constant: cfg.constant,
        pnerd,
    }
}

/// Apply weights, caps and positive-only rules to oriented z-scores.
/// A null z-score contributes 0.
pub fn pitcher_components(
    z: &PitcherZScores,
    stats: &PitcherStats,
    cfg: &PitcherScoring,
) -> PitcherComponents {
    let or_zero = |v: Option<f64>| v.unwrap_or(0.0);
    let luck = stats
        .era_minus_xfip_minus
        .filter(|raw| raw.is_finite())
        .map_or(0.0, |raw| (raw / cfg.luck_divisor).clamp(0.0, cfg.luck_cap));
    let knuckleball = stats
        .knuckleball_rate
        .filter(|rate| rate.is_finite())
        .unwrap_or(0.0);

    PitcherComponents {
        xfip_minus: or_zero(z.xfip_minus) * cfg.xfip_minus_weight,
        swinging_strike: or_zero(z.swinging_strike_rate) * cfg.swinging_strike_weight,
        strike: or_zero(z.strike_rate) * cfg.strike_weight,
        velocity: or_zero(z.velocity).clamp(0.0, cfg.velocity_cap),
        age: or_zero(z.age).clamp(0.0, cfg.age_cap),
        pace: or_zero(z.pace) * cfg.pace_weight,
        luck,
        knuckleball: knuckleball * cfg.knuckleball_weight,
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Scored pitchers for one run, keyed for lookup by schedule starter names.
#[derive(Debug, Clone, Default)]
pub struct PitcherScores {
    scores: Vec<PitcherNerdStats>,
    by_name: HashMap<String, usize>,
    /// Normalized name to record; `None` when two records share the key.
    by_key: HashMap<String, Option<usize>>,
}

impl PitcherScores {
    /// Look up a starter. Exact name match first, then a normalized match
    /// (case, accents, punctuation and generational suffixes ignored).
    /// `None` means the pitcher has no qualifying record, or the normalized
    /// name matches more than one record.
    pub fn lookup(&self, name: &str) -> Option<&PitcherNerdStats> {
        let trimmed = name.trim();
        if let Some(&idx) = self.by_name.get(trimmed) {
            return Some(&self.scores[idx]);
        }
        match self.by_key.get(&normalize_person_name(trimmed))? {
            Some(idx) => Some(&self.scores[*idx]),
            None => {
                warn!(pitcher = trimmed, "starter name matches several pitchers, not guessing");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PitcherNerdStats> {
        self.scores.iter()
    }

    fn insert(&mut self, stats: PitcherNerdStats) {
        let idx = self.scores.len();
        if self.by_name.insert(stats.name.clone(), idx).is_some() {
            warn!(pitcher = %stats.name, "duplicate pitcher record, keeping the latest");
        }
        let key = normalize_person_name(&stats.name);
        let slot = match self.by_key.get(&key) {
            Some(Some(prev)) if self.scores[*prev].name != stats.name => {
                debug!(key = %key, "normalized pitcher name is ambiguous");
                None
            }
            Some(None) => None,
            _ => Some(idx),
        };
        self.by_key.insert(key, slot);
        self.scores.push(stats);
    }
}

/// Filter the qualifying starters, build their population, and score each.
///
/// Pitchers outside the population get no `PitcherNerdStats`; a later lookup
/// reports them as missing rather than fabricating a score.
pub fn score_pitchers(all: &[PitcherStats], cfg: &PitcherScoring) -> PitcherScores {
    let pool: Vec<&PitcherStats> = all.iter().filter(|p| p.qualifies(cfg)).collect();
    info!(
        supplied = all.len(),
        qualified = pool.len(),
        min_innings = cfg.min_innings,
        "building pitcher population"
    );

    let population = PitcherPopulation::from_pitchers(&pool);
    let mut scores = PitcherScores::default();
    for pitcher in pool {
        scores.insert(score_pitcher(pitcher, &population, cfg));
    }
    scores
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
