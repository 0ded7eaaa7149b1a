#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use edugame::api::{
    AddQuestionToGame, ApiError, Category, CategoryFilter, CategoryKey, ContentApi,
    CreateQuestionRequest, CreatedQuestion, Game, GamePage, UploadedImage,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(String),
    Create(CreateQuestionRequest),
    ListCategories,
    CreateCategory(CategoryKey),
    ListGames(u32),
    Attach { game_id: String, question_id: String, points: u32 },
}

/// In-memory `ContentApi` that records every call and fails on demand.
#[derive(Default)]
pub struct FakeApi {
    pub game_pages: Vec<Vec<Game>>,
    pub categories: RefCell<Vec<Category>>,
    /// 1-based create calls that the server rejects
    pub reject_creates: Vec<usize>,
    pub reject_uploads: bool,
    pub failing_game_page: Option<u32>,
    pub failing_attachments: Vec<(String, String)>,
    pub calls: RefCell<Vec<Call>>,
    pub creates: Cell<usize>,
}

pub fn game(id: &str) -> Game {
    Game {
        id: id.to_string(),
        name: format!("Game {id}"),
    }
}

fn server_error(message: &str) -> ApiError {
    ApiError::Server {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeApi {
    pub fn with_games(pages: Vec<Vec<&str>>) -> Self {
        Self {
            game_pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(game).collect())
                .collect(),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<CreateQuestionRequest> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Create(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn attachments(&self) -> Vec<(String, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Attach {
                    game_id,
                    question_id,
                    ..
                } => Some((question_id.clone(), game_id.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| matches(c)).count()
    }
}

impl ContentApi for FakeApi {
    fn upload_image(&self, file_name: &str, _bytes: &[u8]) -> Result<UploadedImage, ApiError> {
        self.calls.borrow_mut().push(Call::Upload(file_name.to_string()));
        if self.reject_uploads {
            return Err(server_error("upload rejected"));
        }
        Ok(UploadedImage {
            url: format!("/uploads/{file_name}"),
        })
    }

    fn create_question(&self, request: &CreateQuestionRequest) -> Result<CreatedQuestion, ApiError> {
        self.calls.borrow_mut().push(Call::Create(request.clone()));
        let n = self.creates.get() + 1;
        self.creates.set(n);
        if self.reject_creates.contains(&n) {
            return Err(server_error("validation failed"));
        }
        Ok(CreatedQuestion {
            id: format!("q{n}"),
        })
    }

    fn list_categories(&self, _filter: &CategoryFilter) -> Result<Vec<Category>, ApiError> {
        self.calls.borrow_mut().push(Call::ListCategories);
        Ok(self.categories.borrow().clone())
    }

    fn create_category(&self, key: &CategoryKey) -> Result<Category, ApiError> {
        self.calls.borrow_mut().push(Call::CreateCategory(key.clone()));
        let category = Category {
            id: format!("cat{}", self.categories.borrow().len() + 1),
            grade: key.grade.clone(),
            subject: key.subject.clone(),
            unit: key.unit.clone(),
            topic: key.topic.clone(),
        };
        self.categories.borrow_mut().push(category.clone());
        Ok(category)
    }

    fn list_games(&self, page: u32) -> Result<GamePage, ApiError> {
        self.calls.borrow_mut().push(Call::ListGames(page));
        if self.failing_game_page == Some(page) {
            return Err(server_error("listing failed"));
        }
        let games = self
            .game_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(GamePage {
            games,
            page,
            total_pages: self.game_pages.len().max(1) as u32,
        })
    }

    fn add_question_to_game(
        &self,
        game_id: &str,
        request: &AddQuestionToGame,
    ) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(Call::Attach {
            game_id: game_id.to_string(),
            question_id: request.question_id.clone(),
            points: request.points,
        });
        let pair = (request.question_id.clone(), game_id.to_string());
        if self.failing_attachments.contains(&pair) {
            return Err(server_error("attach failed"));
        }
        Ok(())
    }
}
