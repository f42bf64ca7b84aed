use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use repo_tree::ArchiveError;
use thiserror::Error;

/// Failures of a `/tree` request.
///
/// The `Display` text carries the underlying cause and is only logged; the
/// client gets the fixed message from [`AppError::client_message`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing url parameter")]
    MissingUrl,
    #[error("invalid GitHub URL")]
    InvalidUrl,
    #[error("failed to create scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),
    #[error("download failed: {0}")]
    Download(#[source] ArchiveError),
    #[error("extraction failed: {0}")]
    Extract(#[source] ArchiveError),
    #[error("no repository root in extracted archive")]
    EmptyRepo,
    #[error("request timed out")]
    TimedOut,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn client_message(&self) -> &'static str {
        match self {
            AppError::MissingUrl => "Missing 'url' parameter",
            AppError::InvalidUrl => "Invalid GitHub URL",
            AppError::ScratchDir(_) => "Failed to create temp dir",
            AppError::Download(_) => "Failed to download repo",
            AppError::Extract(_) => "Failed to unzip repo",
            AppError::EmptyRepo => "Empty or invalid repo content",
            AppError::TimedOut => "Request timed out",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingUrl | AppError::InvalidUrl => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.client_message())
    }
}
