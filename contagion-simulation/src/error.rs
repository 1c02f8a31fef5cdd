use contagion_config::ConfigError;
use contagion_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    /// The configuration is outside the domain the engine supports.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An engine invariant broke mid-tick. Not recoverable.
    #[error("Engine fault: {0}")]
    Core(#[from] CoreError),

    #[error("Population has already been seeded")]
    AlreadySeeded,
}
