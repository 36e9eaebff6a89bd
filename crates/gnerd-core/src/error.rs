// Error types for the scoring engine and the description seam.

use thiserror::Error;

/// Structural input errors that abort scoring of a slate.
///
/// Missing pitcher records and degenerate metric populations are not errors:
/// they are represented in the data (`StarterScore::NoData`, zero z-scores).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("team `{team}` is missing required field `{field}`")]
    IncompleteTeamRecord { team: String, field: &'static str },

    #[error("schedule references team `{team}` with no team statistics")]
    UnknownTeam { team: String },

    #[error("no {role} records supplied")]
    EmptyPopulation { role: &'static str },
}

/// Failure of the external text-generation collaborator for one game.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptionError {
    #[error("description generation is not configured")]
    Disabled,

    #[error("description request failed: {0}")]
    Request(String),

    #[error("description generator returned an empty response")]
    EmptyResponse,
}
