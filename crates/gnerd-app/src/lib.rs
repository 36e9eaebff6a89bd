// Library root: re-exports all modules so integration tests can drive the
// pipeline without the binary.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod render;
