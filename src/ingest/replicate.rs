//! Best-effort fan-out of new questions into every existing game.

use tracing::{debug, info, warn};

use crate::api::{AddQuestionToGame, ContentApi, Game};

/// Upper bound on listing pages, in case the server never reports an end.
pub const MAX_GAME_PAGES: u32 = 1000;

/// Outcome of attaching one question to one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationResult {
    pub question_id: String,
    pub game_id: String,
    pub error: Option<String>,
}

impl ReplicationResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    pub games: usize,
    pub results: Vec<ReplicationResult>,
    /// set when the game listing failed part-way (or entirely)
    pub listing_error: Option<String>,
}

impl ReplicationReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }
}

/// Lists every game, following pages until the last one.
///
/// Games gathered before a failing page are kept; the error is returned
/// alongside them.
pub fn list_all_games<A>(api: &A) -> (Vec<Game>, Option<String>)
where
    A: ContentApi + ?Sized,
{
    let mut games = Vec::new();
    let mut page = 1;
    loop {
        match api.list_games(page) {
            Ok(listing) => {
                let count = listing.games.len();
                games.extend(listing.games);
                debug!(page, count, total_pages = listing.total_pages, "listed games");
                if count == 0 || page >= listing.total_pages || page >= MAX_GAME_PAGES {
                    return (games, None);
                }
                page += 1;
            }
            Err(e) => {
                warn!(page, error = %e, "could not list games");
                return (games, Some(format!("page {}: {}", page, e)));
            }
        }
    }
}

/// Attaches each created question to each game with `points`.
///
/// Every (question, game) pair is tried exactly once; a failure is logged
/// and recorded, never retried and never rolled back.
pub fn replicate<A>(api: &A, created_ids: &[String], points: u32) -> ReplicationReport
where
    A: ContentApi + ?Sized,
{
    if created_ids.is_empty() {
        return ReplicationReport::default();
    }

    let (games, listing_error) = list_all_games(api);
    let mut results = Vec::with_capacity(games.len() * created_ids.len());

    for game in &games {
        for question_id in created_ids {
            let request = AddQuestionToGame {
                question_id: question_id.clone(),
                points,
            };
            let error = match api.add_question_to_game(&game.id, &request) {
                Ok(()) => {
                    debug!(question = %question_id, game = %game.id, "question added to game");
                    None
                }
                Err(e) => {
                    warn!(question = %question_id, game = %game.id, error = %e, "could not add question to game");
                    Some(e.to_string())
                }
            };
            results.push(ReplicationResult {
                question_id: question_id.clone(),
                game_id: game.id.clone(),
                error,
            });
        }
    }

    let report = ReplicationReport {
        games: games.len(),
        results,
        listing_error,
    };
    info!(
        games = report.games,
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        "replicated questions into games"
    );
    report
}
