use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{cli::session::StoredSession, middleware_layer::auth::SESSION_COOKIE};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// A thin HTTP client for the usergate API.
pub struct ApiClient {
    http: reqwest::Client,
    server: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> anyhow::Result<reqwest::Response> {
        let mut request = self.http.request(method, self.url(path));

        if let Some(token) = &self.token {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.server))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = sonic_rs::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Request failed").to_string());

        if status == StatusCode::UNAUTHORIZED {
            anyhow::bail!("{} (log in with `usergate-cli login`)", message);
        }
        anyhow::bail!("{} ({})", message, status.as_u16())
    }

    /// Sends a request and decodes the JSON response.
    pub async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> anyhow::Result<T> {
        let text = self.send(method, path, body).await?.text().await?;
        sonic_rs::from_str(&text).with_context(|| format!("Unexpected response from {}", path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// Logs in and returns the session carried by the `Set-Cookie` header.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<StoredSession> {
        let body = Credentials { email, password };
        let response = self.send(Method::POST, "/login", Some(&body)).await?;

        let cookie = response
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Server did not return a session cookie"))?;

        let expires_at = cookie
            .max_age()
            .and_then(|max_age| chrono::Duration::from_std(max_age).ok())
            .map(|max_age| Utc::now() + max_age);

        Ok(StoredSession {
            server: self.server.clone(),
            token: cookie.value().to_string(),
            expires_at,
        })
    }
}
