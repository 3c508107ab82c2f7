//! Blocking client for the reddit link submission API
//! Handles password-grant login, access token expiry and link submission

pub mod rate_gate;
pub mod response;

use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

pub use rate_gate::{IntervalGate, OpenGate, RateGate};
pub use response::{AccessToken, SubmitOutcome, ALREADY_SUBMITTED_CODE};

use response::{decode_submit, decode_token};

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const SUBMIT_URL: &str = "https://oauth.reddit.com/api/submit";

/// Applied to every request, login and submit alike
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum RedditError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("login failed: {0}")]
    Authentication(String),
    #[error("not logged in or access token expired")]
    NotAuthenticated,
    #[error("submit error: {body} URL: {uri}\n{form}")]
    Api {
        body: String,
        uri: String,
        form: String,
    },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

/// A link post as the submit endpoint receives it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPost {
    pub subreddit: String,
    pub title: String,
    pub url: String,
}

impl LinkPost {
    fn form_pairs(&self) -> [(&str, &str); 8] {
        [
            ("sr", self.subreddit.as_str()),
            ("title", self.title.as_str()),
            ("url", self.url.as_str()),
            ("kind", "link"),
            ("uh", ""),
            ("resubmit", "false"),
            ("nsfw", "false"),
            ("api_type", "json"),
        ]
    }

    /// Form-encoded request body
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_pairs())
            .finish()
    }
}

pub struct RedditClient {
    client: Client,
    credentials: Credentials,
    user_agent: String,
    token_url: String,
    submit_url: String,
    gate: Box<dyn RateGate>,
    token: Option<AccessToken>,
}

impl RedditClient {
    pub fn new(credentials: Credentials, user_agent: &str) -> Result<Self, RedditError> {
        Self::with_gate(credentials, user_agent, Box::new(IntervalGate::default()))
    }

    pub fn with_gate(
        credentials: Credentials,
        user_agent: &str,
        gate: Box<dyn RateGate>,
    ) -> Result<Self, RedditError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            credentials,
            user_agent: user_agent.to_string(),
            token_url: TOKEN_URL.to_string(),
            submit_url: SUBMIT_URL.to_string(),
            gate,
            token: None,
        })
    }

    /// Point the client at different token and submit endpoints
    pub fn with_endpoints(mut self, token_url: &str, submit_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.submit_url = submit_url.to_string();
        self
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    /// Exchange the account password for an access token.
    /// On any failure the client stays logged out.
    pub fn login(&mut self) -> Result<(), RedditError> {
        self.token = None;

        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "password")
            .append_pair("username", &self.credentials.username)
            .append_pair("password", &self.credentials.password)
            .finish();

        self.gate.wait();
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::Authentication(format!("status code {}", status)));
        }

        let content_type = content_type(&response);
        let body = response.text()?;

        if !content_type.contains("application/json") {
            return Err(RedditError::Authentication(format!(
                "invalid content type: {} body: {}",
                content_type, body
            )));
        }

        let token = decode_token(&body, Utc::now())?;
        debug!("Access token valid until {}", token.expires_at);
        self.token = Some(token);

        Ok(())
    }

    /// Submit a link post. A duplicate link is reported as
    /// [`SubmitOutcome::AlreadySubmitted`], every other failure as an error.
    pub fn submit_link(&self, post: &LinkPost) -> Result<SubmitOutcome, RedditError> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.is_expired())
            .ok_or(RedditError::NotAuthenticated)?;

        let form = post.encode();

        self.gate.wait();
        let response = self
            .client
            .post(&self.submit_url)
            .header(USER_AGENT, &self.user_agent)
            .header(AUTHORIZATION, token.authorization())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.clone())
            .send()?;

        let status = response.status();
        let uri = request_uri(response.url());
        let content_type = content_type(&response);
        let body = response.text()?;

        if !status.is_success() {
            return Err(RedditError::Api { body, uri, form });
        }

        debug!("Submit response: {}", body);

        if !content_type.contains("application/json") {
            return Err(RedditError::UnexpectedResponse(format!(
                "invalid content type: {} body: {}",
                content_type, body
            )));
        }

        decode_submit(&body)
    }
}

fn content_type(response: &reqwest::blocking::Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn request_uri(url: &url::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
