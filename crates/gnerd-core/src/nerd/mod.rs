// Watchability models: population z-scores, pNERD, tNERD and gNERD.

pub mod game;
pub mod pitcher;
pub mod population;
pub mod team;
