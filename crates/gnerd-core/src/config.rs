// Scoring configuration: constants, weights, caps and floors for the NERD formulas.
//
// Every field has a serde default so a TOML file may override any subset.
// `ScoringConfig::default()` carries the historical values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid scoring config field `{field}`: {message}")]
pub struct ScoringConfigError {
    pub field: String,
    pub message: String,
}

/// All tunable inputs of the pitcher, team and game models.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub pitcher: PitcherScoring,
    pub team: TeamScoring,
    pub game: GameScoring,
}

/// pNERD weights and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitcherScoring {
    pub constant: f64,
    /// Starters below this many innings are left out of the population.
    pub min_innings: f64,
    pub xfip_minus_weight: f64,
    pub swinging_strike_weight: f64,
    pub strike_weight: f64,
    pub pace_weight: f64,
    pub velocity_cap: f64,
    pub age_cap: f64,
    pub luck_divisor: f64,
    pub luck_cap: f64,
    pub knuckleball_weight: f64,
}

impl Default for PitcherScoring {
    fn default() -> Self {
        Self {
            constant: 3.8,
            min_innings: 20.0,
            xfip_minus_weight: 2.0,
            swinging_strike_weight: 0.5,
            strike_weight: 0.5,
            pace_weight: 0.5,
            velocity_cap: 2.0,
            age_cap: 2.0,
            luck_divisor: 20.0,
            luck_cap: 1.0,
            knuckleball_weight: 5.0,
        }
    }
}

/// tNERD constant and limits. Payroll and age are floored at 0 and uncapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamScoring {
    pub constant: f64,
    pub luck_cap: f64,
}

impl Default for TeamScoring {
    fn default() -> Self {
        Self {
            constant: 4.0,
            luck_cap: 2.0,
        }
    }
}

/// gNERD aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameScoring {
    /// pNERD used in place of a starter with no qualifying data.
    pub missing_pitcher_substitute: f64,
}

impl Default for GameScoring {
    fn default() -> Self {
        Self {
            missing_pitcher_substitute: 5.0,
        }
    }
}

impl ScoringConfig {
    /// Check that caps and divisors are usable.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let p = &self.pitcher;
        let positive: &[(&str, f64)] = &[
            ("scoring.pitcher.velocity_cap", p.velocity_cap),
            ("scoring.pitcher.age_cap", p.age_cap),
            ("scoring.pitcher.luck_divisor", p.luck_divisor),
            ("scoring.pitcher.luck_cap", p.luck_cap),
            ("scoring.team.luck_cap", self.team.luck_cap),
        ];
        for (name, val) in positive {
            if *val <= 0.0 || !val.is_finite() {
                return Err(ScoringConfigError {
                    field: name.to_string(),
                    message: format!("must be a finite value > 0, got {val}"),
                });
            }
        }

        if p.min_innings < 0.0 || p.min_innings.is_nan() {
            return Err(ScoringConfigError {
                field: "scoring.pitcher.min_innings".into(),
                message: format!("must be >= 0, got {}", p.min_innings),
            });
        }

        let finite: &[(&str, f64)] = &[
            ("scoring.pitcher.constant", p.constant),
            ("scoring.pitcher.xfip_minus_weight", p.xfip_minus_weight),
            ("scoring.pitcher.swinging_strike_weight", p.swinging_strike_weight),
            ("scoring.pitcher.strike_weight", p.strike_weight),
            ("scoring.pitcher.pace_weight", p.pace_weight),
            ("scoring.pitcher.knuckleball_weight", p.knuckleball_weight),
            ("scoring.team.constant", self.team.constant),
            (
                "scoring.game.missing_pitcher_substitute",
                self.game.missing_pitcher_substitute,
            ),
        ];
        for (name, val) in finite {
            if !val.is_finite() {
                return Err(ScoringConfigError {
                    field: name.to_string(),
                    message: format!("must be finite, got {val}"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_constants() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.pitcher.constant, 3.8);
        assert_eq!(cfg.team.constant, 4.0);
        assert_eq!(cfg.game.missing_pitcher_substitute, 5.0);
        assert_eq!(cfg.pitcher.velocity_cap, 2.0);
        assert_eq!(cfg.pitcher.luck_cap, 1.0);
        assert_eq!(cfg.team.luck_cap, 2.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg: ScoringConfig =
            serde_json::from_str(r#"{ "pitcher": { "constant": 4.5 } }"#).unwrap();
        assert_eq!(cfg.pitcher.constant, 4.5);
        assert_eq!(cfg.pitcher.xfip_minus_weight, 2.0);
        assert_eq!(cfg.team, TeamScoring::default());
    }

    #[test]
    fn rejects_zero_luck_divisor() {
        let mut cfg = ScoringConfig::default();
        cfg.pitcher.luck_divisor = 0.0;
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field, "scoring.pitcher.luck_divisor");
    }

    #[test]
    fn rejects_negative_min_innings() {
        let mut cfg = ScoringConfig::default();
        cfg.pitcher.min_innings = -1.0;
        assert_eq!(
            cfg.validate().unwrap_err().field,
            "scoring.pitcher.min_innings"
        );
    }

    #[test]
    fn rejects_nan_substitute() {
        let mut cfg = ScoringConfig::default();
        cfg.game.missing_pitcher_substitute = f64::NAN;
        assert_eq!(
            cfg.validate().unwrap_err().field,
            "scoring.game.missing_pitcher_substitute"
        );
    }
}
