//! CLI subcommands.

pub mod ask;
pub mod identify;
pub mod plants;

/// Errors shared by the subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Backend(#[from] herbal_garden_web::backend::BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Rejected(String),
}
