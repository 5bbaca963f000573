pub mod agent;
pub mod cohort;

pub use agent::Agent;
pub use cohort::Cohort;
