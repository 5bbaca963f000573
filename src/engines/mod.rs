pub mod generation;
pub mod policy;
pub mod simulation;
