use crate::node::NodeError;
use crate::page::PageError;
use crate::resolver::ResolutionErrors;
use crate::theme::ValidationErrors;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Theme(#[from] ValidationErrors),
    #[error(transparent)]
    Resolution(#[from] ResolutionErrors),
}
