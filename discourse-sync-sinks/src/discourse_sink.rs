use crate::{PostSink, SinkError};
use discourse_sync_lib::{DiscourseConfig, NewPost, PostId};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("discourse-sync/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an unrecognised error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

/// Publishes documents as posts on a Discourse forum
pub struct DiscourseSink {
    client: Client,
    /// Forum root, always ending in `/` so relative joins stay under it
    base_url: Url,
    api_username: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    title: &'a str,
    raw: &'a str,
    category: u64,
    tags: &'a [String],
}

#[derive(Debug, Serialize)]
struct UpdatePostRequest<'a> {
    post: UpdatePostFields<'a>,
}

#[derive(Debug, Serialize)]
struct UpdatePostFields<'a> {
    raw: &'a str,
    edit_reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: PostId,
    #[serde(default)]
    topic_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    error_type: Option<String>,
}

impl DiscourseSink {
    /// Create a new Discourse sink
    ///
    /// Fails with [`SinkError::Config`] when the host is not an absolute URL
    /// or when the API username or key is missing.
    pub fn new(config: &DiscourseConfig) -> Result<Self, SinkError> {
        let base_url = Self::parse_host(&config.host)?;
        let api_username = Self::required(config.api_username.as_deref(), "DISCOURSE_API_USERNAME")?;
        let api_key = Self::required(config.api_key.as_deref(), "DISCOURSE_API_KEY")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SinkError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_username,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_host(host: &str) -> Result<Url, SinkError> {
        let mut url = Url::parse(host.trim())
            .map_err(|e| SinkError::Config(format!("Invalid Discourse host `{}`: {}", host, e)))?;

        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(SinkError::Config(format!(
                "Discourse host must be an http(s) URL: {}",
                host
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    fn required(value: Option<&str>, var: &str) -> Result<String, SinkError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(SinkError::Config(format!("{} is not set", var))),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SinkError> {
        self.base_url
            .join(path)
            .map_err(|e| SinkError::Config(format!("Invalid endpoint `{}`: {}", path, e)))
    }

    /// Attach credentials, send, and return the body of a successful response
    fn send(&self, request: RequestBuilder) -> Result<String, SinkError> {
        let response = request
            .header("Api-Key", &self.api_key)
            .header("Api-Username", &self.api_username)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| SinkError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SinkError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(SinkError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}

/// Pull a readable message out of a Discourse error response
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.errors.is_empty() {
            return parsed.errors.join("; ");
        }
        if let Some(error_type) = parsed.error_type {
            return error_type;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    if body.chars().count() > MAX_ERROR_BODY {
        let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
        return format!("{}...", truncated);
    }
    body.to_string()
}

fn parse_created_post(body: &str) -> Result<CreatedPost, SinkError> {
    serde_json::from_str(body)
        .map_err(|e| SinkError::Serialization(format!("Unexpected create post response: {}", e)))
}

impl PostSink for DiscourseSink {
    fn create_post(&mut self, post: &NewPost) -> Result<PostId, SinkError> {
        let url = self.endpoint("posts.json")?;
        debug!(url = %url, title = %post.title, category = post.category_id, "Creating post");

        let body = CreatePostRequest {
            title: &post.title,
            raw: &post.content,
            category: post.category_id,
            tags: &post.tags,
        };
        let response = self.send(self.client.post(url).json(&body))?;
        let created = parse_created_post(&response)?;

        info!(post_id = created.id, topic_id = ?created.topic_id, "Discourse accepted new post");
        Ok(created.id)
    }

    fn update_post(&mut self, post_id: PostId, content: &str) -> Result<(), SinkError> {
        let url = self.endpoint(&format!("posts/{}.json", post_id))?;
        debug!(url = %url, post_id, "Updating post");

        let body = UpdatePostRequest {
            post: UpdatePostFields {
                raw: content,
                edit_reason: "",
            },
        };
        self.send(self.client.put(url).json(&body))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "discourse"
    }
}
