pub mod elite;
pub mod operators;
pub mod population;
pub mod progress;

pub use elite::EliteSet;
pub use operators::{roulette_selection, selection_probabilities, SelectionPool};
pub use population::PopulationManager;
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressFanout,
    ProgressMessage, RunLogCallback,
};
