use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Query filter validation
    #[error("Bad query: {0}")]
    BadQuery(String),

    // Selector -> job validation
    #[error("Bad selector: {0}")]
    BadSelector(String),

    // Goal ran but found no consistent plan
    #[error("No solution possible")]
    NoSolution,

    // Goal ran but the plan would erase protected packages
    #[error("No solution, cannot remove protected package")]
    RemovalOfProtected { names: Vec<String> },

    // Invariant violation, e.g. listing results before run
    #[error("Internal error: {0}")]
    Internal(String),

    // Debug-data writer failures
    #[error("Failed writing debugdata: {0}")]
    FileInvalid(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
