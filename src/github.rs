//! Minimal GitHub REST client: create a repository, tag it, upload a README.

use std::sync::Arc;
use std::time::Duration;

use data_encoding::BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::GitHubError;
use crate::http_client::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
use crate::normalizer::dedup_topics;

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub rejects topic lists longer than this.
pub const GITHUB_TOPIC_LIMIT: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("reposeed/", env!("CARGO_PKG_VERSION"));

/// The repository as GitHub reports it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRepository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

pub struct GitHubClient {
    http: Arc<dyn HttpClient>,
    token: String,
    api_url: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(token, Arc::new(ReqwestHttpClient::new()), GITHUB_API_URL)
    }

    pub fn with_client(
        token: impl Into<String>,
        http: Arc<dyn HttpClient>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `POST /user/repos`
    pub async fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<CreatedRepository, GitHubError> {
        let url = format!("{}/user/repos", self.api_url);
        let body = json!({
            "name": name,
            "description": description,
            "private": private,
            "auto_init": false,
        });

        info!(repo = name, private, "creating GitHub repository");
        let response = self.send_post(&url, &body).await?;
        let body = self.check(response, name)?;
        let repo: CreatedRepository = serde_json::from_str(&body)?;
        info!(repo = %repo.full_name, url = %repo.html_url, "repository created");
        Ok(repo)
    }

    /// `PUT /repos/{owner}/{repo}/topics`, capped at GitHub's limit.
    pub async fn set_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<Vec<String>, GitHubError> {
        let names = dedup_topics(topics.iter().map(String::as_str), GITHUB_TOPIC_LIMIT);
        let url = format!("{}/repos/{owner}/{repo}/topics", self.api_url);
        let body = json!({ "names": names });

        debug!(repo, count = names.len(), "setting repository topics");
        let response = self.send_put(&url, &body).await?;
        self.check(response, repo)?;
        Ok(names)
    }

    /// `PUT /repos/{owner}/{repo}/contents/README.md`
    pub async fn upload_readme(
        &self,
        owner: &str,
        repo: &str,
        readme: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/README.md", self.api_url);
        let body = json!({
            "message": "Add README",
            "content": BASE64.encode(readme.as_bytes()),
        });

        debug!(repo, bytes = readme.len(), "uploading README");
        let response = self.send_put(&url, &body).await?;
        self.check(response, repo)?;
        Ok(())
    }

    fn headers(&self) -> Vec<(&str, String)> {
        vec![
            ("Authorization", format!("Bearer {}", self.token)),
            ("Accept", "application/vnd.github+json".to_string()),
            ("X-GitHub-Api-Version", "2022-11-28".to_string()),
            ("User-Agent", USER_AGENT.to_string()),
        ]
    }

    async fn send_post(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, GitHubError> {
        let owned = self.headers();
        let headers: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.http
            .post_json(url, &headers, body, REQUEST_TIMEOUT)
            .await
            .map_err(translate_transport)
    }

    async fn send_put(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, GitHubError> {
        let owned = self.headers();
        let headers: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.http
            .put_json(url, &headers, body, REQUEST_TIMEOUT)
            .await
            .map_err(translate_transport)
    }

    fn check(&self, response: HttpResponse, subject: &str) -> Result<String, GitHubError> {
        if response.is_success() {
            return Ok(response.body);
        }
        let message = error_message(&response.body);
        Err(match response.status {
            401 => GitHubError::Authentication(message),
            429 => GitHubError::RateLimited(message),
            403 if message.to_lowercase().contains("rate limit") => {
                GitHubError::RateLimited(message)
            }
            403 => GitHubError::Forbidden(message),
            404 => GitHubError::NotFound(message),
            422 if message.contains("already exists") => {
                GitHubError::AlreadyExists(subject.to_string())
            }
            422 => GitHubError::Validation(message),
            status => GitHubError::Api { status, message },
        })
    }
}

fn translate_transport(err: TransportError) -> GitHubError {
    GitHubError::Transport(err.to_string())
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Flattens GitHub's `{message, errors: [{message}]}` error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let details: Vec<String> = parsed.errors.into_iter().filter_map(|e| e.message).collect();
            if details.is_empty() {
                parsed.message
            } else {
                format!("{}: {}", parsed.message, details.join("; "))
            }
        }
        Err(_) => body.trim().to_string(),
    }
}
