use reqwest::Method;
use serde::Serialize;

use crate::cli::{
    client::ApiClient,
    output::{self, MessageView, UserView},
    session, OutputFormat,
};

#[derive(Serialize)]
struct SignupBody<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

pub async fn signup(
    client: &ApiClient,
    format: &OutputFormat,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let body = SignupBody {
        email,
        password,
        name,
    };
    let response: MessageView = client.request(Method::POST, "/signup", Some(&body)).await?;
    output::print_item(format, &response)
}

/// Logs in and stores the session for later commands.
pub async fn login(
    client: &ApiClient,
    format: &OutputFormat,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let stored = client.login(email, password).await?;
    session::save(&stored)?;

    tracing::debug!("Session stored for {}", client.server());
    output::print_message(format, &format!("Logged in as {}", email))
}

/// Clears the server cookie and forgets the stored token.
///
/// The token is removed locally even when the server cannot be reached.
pub async fn logout(client: &ApiClient, format: &OutputFormat) -> anyhow::Result<()> {
    let result: anyhow::Result<MessageView> =
        client.request(Method::POST, "/logout", None::<&()>).await;
    session::clear()?;

    if let Err(e) = result {
        tracing::warn!("Server logout failed: {}", e);
    }
    output::print_message(format, "Logged out")
}

pub async fn whoami(client: &ApiClient, format: &OutputFormat) -> anyhow::Result<()> {
    let user: UserView = client.get("/me").await?;
    output::print_item(format, &user)
}
