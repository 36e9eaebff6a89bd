// Input data loading: pitcher and team statistics (FanGraphs-style CSV
// exports) and the day's schedule (JSON).
//
// Malformed pitcher rows are skipped with a warning. A malformed team row is
// an error: every team belongs to the league population. Non-finite cells
// (`NaN`, `inf`) read as missing.

use gnerd_core::nerd::game::ScheduledGame;
use gnerd_core::nerd::pitcher::PitcherStats;
use gnerd_core::nerd::team::TeamStats;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ResolvedPaths;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything needed to score one day.
#[derive(Debug, Clone)]
pub struct SlateInputs {
    pub pitchers: Vec<PitcherStats>,
    pub teams: Vec<TeamStats>,
    pub schedule: Vec<ScheduledGame>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private), FanGraphs column names
// ---------------------------------------------------------------------------

/// FanGraphs starter leaderboard row. Blank cells read as `None`; unknown
/// columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPitcher {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    IP: Option<f64>,
    #[serde(default)]
    GS: Option<u32>,
    #[serde(default, rename = "xFIP-")]
    xfip_minus: Option<f64>,
    #[serde(default, rename = "ERA-")]
    era_minus: Option<f64>,
    #[serde(default, rename = "SwStr%")]
    swstr: Option<f64>,
    #[serde(default, rename = "Strike%")]
    strike: Option<f64>,
    #[serde(default)]
    Strikes: Option<u32>,
    #[serde(default)]
    Pitches: Option<u32>,
    #[serde(default, alias = "vFA (pi)")]
    FBv: Option<f64>,
    #[serde(default)]
    Age: Option<f64>,
    #[serde(default)]
    Pace: Option<f64>,
    #[serde(default, rename = "KN%")]
    knuckleball: Option<f64>,
}

/// Drop a non-finite cell, logging which entity and column it came from.
fn finite(value: Option<f64>, entity: &str, column: &str) -> Option<f64> {
    match value {
        Some(v) if !v.is_finite() => {
            warn!("ignoring non-finite {} value for '{}'", column, entity);
            None
        }
        other => other,
    }
}

impl RawPitcher {
    fn into_stats(self) -> PitcherStats {
        let name = self.Name.trim().to_string();
        let xfip_minus = finite(self.xfip_minus, &name, "xFIP-");
        let luck = match (finite(self.era_minus, &name, "ERA-"), xfip_minus) {
            (Some(era), Some(xfip)) => Some(era - xfip),
            _ => None,
        };
        PitcherStats {
            team: self.Team.trim().to_string(),
            innings_pitched: finite(self.IP, &name, "IP"),
            games_started: self.GS,
            xfip_minus,
            swinging_strike_rate: finite(self.swstr, &name, "SwStr%"),
            strike_rate: finite(self.strike, &name, "Strike%"),
            strikes: self.Strikes,
            pitches: self.Pitches,
            velocity: finite(self.FBv, &name, "FBv"),
            age: finite(self.Age, &name, "Age"),
            pace: finite(self.Pace, &name, "Pace"),
            era_minus_xfip_minus: luck,
            knuckleball_rate: finite(self.knuckleball, &name, "KN%"),
            name,
        }
    }
}

/// Team leaderboard row joined with payroll. Luck is read directly or
/// derived from `wRC - R`.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawTeam {
    Team: String,
    #[serde(default, alias = "Bat")]
    Batting: Option<f64>,
    #[serde(default, rename = "Barrel%")]
    barrel: Option<f64>,
    #[serde(default, alias = "BsR")]
    BaseRunning: Option<f64>,
    #[serde(default, alias = "Fld")]
    Fielding: Option<f64>,
    #[serde(default, alias = "RAR")]
    Bullpen: Option<f64>,
    #[serde(default)]
    Payroll: Option<f64>,
    #[serde(default)]
    Age: Option<f64>,
    #[serde(default)]
    Luck: Option<f64>,
    #[serde(default)]
    wRC: Option<f64>,
    #[serde(default)]
    R: Option<f64>,
}

impl RawTeam {
    /// Non-finite cells become `None`, which scoring reports as an
    /// incomplete team record.
    fn into_stats(self) -> TeamStats {
        let name = self.Team.trim().to_string();
        let derived = match (finite(self.wRC, &name, "wRC"), finite(self.R, &name, "R")) {
            (Some(wrc), Some(runs)) => Some(wrc - runs),
            _ => None,
        };
        TeamStats {
            batting_runs: finite(self.Batting, &name, "Batting"),
            barrel_rate: finite(self.barrel, &name, "Barrel%"),
            baserunning_runs: finite(self.BaseRunning, &name, "BaseRunning"),
            fielding_runs: finite(self.Fielding, &name, "Fielding"),
            bullpen_runs: finite(self.Bullpen, &name, "Bullpen"),
            payroll: finite(self.Payroll, &name, "Payroll"),
            age: finite(self.Age, &name, "Age"),
            luck: finite(self.Luck, &name, "Luck").or(derived),
            name,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

pub fn load_pitchers_from_reader<R: Read>(rdr: R) -> Result<Vec<PitcherStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut pitchers = Vec::new();
    for result in reader.deserialize::<RawPitcher>() {
        match result {
            Ok(raw) => {
                if raw.Name.trim().is_empty() {
                    warn!("skipping pitcher row with empty name");
                    continue;
                }
                pitchers.push(raw.into_stats());
            }
            Err(e) => {
                warn!("skipping malformed pitcher row: {}", e);
            }
        }
    }
    Ok(pitchers)
}

/// Unlike pitchers, a team row that fails to parse aborts the load.
pub fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeam>() {
        let raw = result?;
        if raw.Team.trim().is_empty() {
            warn!("skipping team row with empty name");
            continue;
        }
        teams.push(raw.into_stats());
    }
    Ok(teams)
}

pub fn load_schedule_from_reader<R: Read>(rdr: R) -> Result<Vec<ScheduledGame>, serde_json::Error> {
    serde_json::from_reader(rdr)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_pitchers(path: &Path) -> Result<Vec<PitcherStats>, DataError> {
    load_pitchers_from_reader(open(path)?).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_teams(path: &Path) -> Result<Vec<TeamStats>, DataError> {
    load_teams_from_reader(open(path)?).map_err(|e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_schedule(path: &Path) -> Result<Vec<ScheduledGame>, DataError> {
    load_schedule_from_reader(std::io::BufReader::new(open(path)?)).map_err(|e| DataError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load pitchers, teams and schedule from the configured paths.
pub fn load_all(paths: &ResolvedPaths) -> Result<SlateInputs, DataError> {
    let pitchers = load_pitchers(&paths.pitchers)?;
    let teams = load_teams(&paths.teams)?;
    let schedule = load_schedule(&paths.schedule)?;
    info!(
        pitchers = pitchers.len(),
        teams = teams.len(),
        games = schedule.len(),
        "loaded slate inputs"
    );
    Ok(SlateInputs {
        pitchers,
        teams,
        schedule,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
