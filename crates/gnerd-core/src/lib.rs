// Library root: the NERD scoring engine and the description seam.

pub mod config;
pub mod describe;
pub mod error;
pub mod nerd;
pub mod teams;

pub use config::ScoringConfig;
pub use describe::{
    Citation, Describer, Description, DescriptionSource, DescriptionState, GameFacts,
};
pub use error::{DescriptionError, ScoreError};
pub use nerd::game::{rank_slate, DescribedGame, RankedSlate, ScheduledGame, ScoredGame};
pub use nerd::pitcher::{score_pitchers, PitcherScores, PitcherStats};
pub use nerd::team::{score_teams, TeamScores, TeamStats};
