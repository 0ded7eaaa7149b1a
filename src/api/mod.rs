mod client;
mod types;

pub use client::HttpClient;
pub use types::{
    AddQuestionToGame, AnswerPayload, Category, CategoryFilter, CategoryKey, CreateQuestionRequest,
    CreatedQuestion, Game, GamePage, UploadedImage,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Failed to read response body: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server returned an error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("Invalid API url: {0}")]
    InvalidUrl(String),
}

/// The REST operations the ingestion pipeline depends on.
///
/// Every call is blocking and issued one at a time by the pipeline; a
/// timeout surfaces as an ordinary `ApiError`.
pub trait ContentApi {
    fn upload_image(&self, file_name: &str, bytes: &[u8]) -> Result<UploadedImage, ApiError>;

    fn create_question(&self, request: &CreateQuestionRequest) -> Result<CreatedQuestion, ApiError>;

    fn list_categories(&self, filter: &CategoryFilter) -> Result<Vec<Category>, ApiError>;

    fn create_category(&self, key: &CategoryKey) -> Result<Category, ApiError>;

    /// Lists one page of games, `page` starts at 1.
    fn list_games(&self, page: u32) -> Result<GamePage, ApiError>;

    fn add_question_to_game(
        &self,
        game_id: &str,
        request: &AddQuestionToGame,
    ) -> Result<(), ApiError>;
}
