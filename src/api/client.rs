use std::{str::FromStr, time::Duration};

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{
    AddQuestionToGame, ApiError, Category, CategoryFilter, CategoryKey, ContentApi,
    CreateQuestionRequest, CreatedQuestion, GamePage, UploadedImage,
};
use crate::config::Config;

/// `ContentApi` over the platform's REST endpoints.
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: Url,
    token: Option<String>,
    games_page_size: u32,
}

impl HttpClient {
    /// Fails when `api_url` is not an absolute http(s) url.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.api_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.clone()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Ok(Self {
            agent,
            base_url,
            token: config.api_token.clone(),
            games_page_size: config.games_page_size,
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: &str, segments: &[&str]) -> Result<ureq::Request, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(method, %url, "api request");
        let request = self.agent.request(method, url.as_str());
        Ok(match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        })
    }
}

impl ContentApi for HttpClient {
    fn upload_image(&self, file_name: &str, bytes: &[u8]) -> Result<UploadedImage, ApiError> {
        let response = self
            .request("POST", &["upload", "image"])?
            .query("filename", file_name)
            .set("Content-Type", content_type(file_name))
            .send_bytes(bytes)
            .map_err(into_api_error)?;

        let body = read_body(response)?;
        let url = get_attribute::<String>(unwrap_data(&body), "url")
            .ok_or_else(|| ApiError::Malformed("upload response has no url".to_string()))?;

        Ok(UploadedImage { url })
    }

    fn create_question(&self, request: &CreateQuestionRequest) -> Result<CreatedQuestion, ApiError> {
        let response = self
            .request("POST", &["questions"])?
            .send_json(request)
            .map_err(into_api_error)?;

        let body = read_body(response)?;
        let id = get_attribute::<String>(unwrap_data(&body), "id")
            .ok_or_else(|| ApiError::Malformed("created question has no id".to_string()))?;

        Ok(CreatedQuestion { id })
    }

    fn list_categories(&self, filter: &CategoryFilter) -> Result<Vec<Category>, ApiError> {
        let request = filter
            .pairs()
            .into_iter()
            .fold(self.request("GET", &["categories"])?, |req, (name, value)| {
                req.query(name, value)
            });
        let response = request.call().map_err(into_api_error)?;

        let body = read_body(response)?;
        serde_json::from_value(unwrap_data(&body).clone())
            .map_err(|e| ApiError::Malformed(format!("category list: {}", e)))
    }

    fn create_category(&self, key: &CategoryKey) -> Result<Category, ApiError> {
        let response = self
            .request("POST", &["categories"])?
            .send_json(key)
            .map_err(into_api_error)?;

        let body = read_body(response)?;
        serde_json::from_value(unwrap_data(&body).clone())
            .map_err(|e| ApiError::Malformed(format!("created category: {}", e)))
    }

    fn list_games(&self, page: u32) -> Result<GamePage, ApiError> {
        let response = self
            .request("GET", &["games"])?
            .query("page", &page.to_string())
            .query("limit", &self.games_page_size.to_string())
            .call()
            .map_err(into_api_error)?;

        let body = read_body(response)?;
        parse_game_page(&body, page)
    }

    fn add_question_to_game(
        &self,
        game_id: &str,
        request: &AddQuestionToGame,
    ) -> Result<(), ApiError> {
        self.request("POST", &["games", game_id, "questions"])?
            .send_json(request)
            .map_err(into_api_error)?;
        Ok(())
    }
}

fn into_api_error(e: ureq::Error) -> ApiError {
    match e {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|body| serde_json::from_str::<Value>(&body).ok())
                .and_then(|body| get_attribute::<String>(&body, "message"))
                .unwrap_or_default();
            ApiError::Server { status, message }
        }
        other => ApiError::Http(other),
    }
}

fn read_body(response: ureq::Response) -> Result<Value, ApiError> {
    // some endpoints acknowledge with an empty body
    let text = response.into_string()?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Malformed(format!("invalid JSON: {}", e)))
}

fn unwrap_data(body: &Value) -> &Value {
    body.get("data").unwrap_or(body)
}

pub(crate) fn parse_game_page(body: &Value, requested: u32) -> Result<GamePage, ApiError> {
    let games = match unwrap_data(body) {
        Value::Array(items) => items.clone(),
        other => other
            .get("games")
            .and_then(|g| g.as_array())
            .cloned()
            .ok_or_else(|| ApiError::Malformed("game listing has no games".to_string()))?,
    };
    let games = serde_json::from_value(Value::Array(games))
        .map_err(|e| ApiError::Malformed(format!("game listing: {}", e)))?;

    let pagination = body
        .get("pagination")
        .or_else(|| unwrap_data(body).get("pagination"));
    let page = pagination
        .and_then(|p| get_attribute::<u32>(p, "page"))
        .unwrap_or(requested);
    let total_pages = pagination
        .and_then(|p| get_attribute::<u32>(p, "totalPages"))
        .unwrap_or(page);

    Ok(GamePage {
        games,
        page,
        total_pages,
    })
}

fn get_attribute<T>(value: &Value, attribute: &str) -> Option<T>
where
    T: FromStr,
{
    value.get(attribute).and_then(|v| match v {
        Value::String(s) => T::from_str(s).ok(),
        Value::Number(n) => T::from_str(&n.to_string()).ok(),
        Value::Bool(b) => T::from_str(&b.to_string()).ok(),
        _ => None,
    })
}

fn content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
