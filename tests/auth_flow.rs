use std::net::SocketAddr;

use serde_json::{json, Value};
use usergate::{router, AppState, Config};

// Shared test context
struct TestContext {
    client: reqwest::Client,
    base_url: String,
}

impl TestContext {
    /// Serves a fresh in-memory instance on an ephemeral port.
    async fn new() -> Self {
        let state = AppState::in_memory(Config::in_memory(b"integration-test-secret"));
        let app = router(state);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Self::cookie_client(),
            base_url: format!("http://{}", addr),
        }
    }

    fn cookie_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signup"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_login_guard_and_deletion() {
        let context = TestContext::new().await;

        // Step 1: Signup
        let response = context.signup("alice@example.com", "pw123").await;
        assert_eq!(response.status().as_u16(), 200, "Signup failed");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert!(body.get("password_hash").is_none());
        assert!(body.get("password").is_none());

        // Step 2: Wrong password
        let response = context.login("alice@example.com", "wrong").await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid email or password");

        // Step 3: Guarded route without a cookie
        let response = context.client.get(context.url("/me")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Unauthorized" }));

        // Step 4: Login
        let response = context.login("alice@example.com", "pw123").await;
        assert_eq!(response.status().as_u16(), 200, "Login failed");
        assert!(
            response.cookies().any(|c| c.name() == "Authorization" && !c.value().is_empty()),
            "Session cookie not found in login response"
        );
        let token = response
            .cookies()
            .find(|c| c.name() == "Authorization")
            .map(|c| c.value().to_string())
            .unwrap();

        // Step 5: Guarded route with the cookie
        let response = context.client.get(context.url("/me")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let me: Value = response.json().await.unwrap();
        assert_eq!(me["email"], "alice@example.com");
        assert!(me.get("password_hash").is_none());
        let user_id = me["id"].as_str().unwrap().to_string();

        // Step 6: Delete the principal, then replay the same token
        let response = context
            .client
            .delete(context.url(&format!("/users/{}", user_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "User deleted");

        let response = reqwest::Client::new()
            .get(context.url("/me"))
            .header("Cookie", format!("Authorization={}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let context = TestContext::new().await;
        context.signup("alice@example.com", "pw123").await;

        let response = context.login("alice@example.com", "pw123").await;
        let set_cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("Authorization="))
            .unwrap()
            .to_string();

        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=2592000"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_generic() {
        let context = TestContext::new().await;
        assert_eq!(context.signup("alice@example.com", "pw123").await.status().as_u16(), 200);

        let response = context.signup("alice@example.com", "other").await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Failed to create user");

        // the original password still works
        assert_eq!(context.login("alice@example.com", "pw123").await.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_unknown_email_matches_wrong_password() {
        let context = TestContext::new().await;
        context.signup("alice@example.com", "pw123").await;

        let unknown = context.login("bob@example.com", "pw123").await;
        let wrong = context.login("alice@example.com", "nope").await;

        assert_eq!(unknown.status(), wrong.status());
        let unknown: Value = unknown.json().await.unwrap();
        let wrong: Value = wrong.json().await.unwrap();
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_rejected() {
        let context = TestContext::new().await;

        let response = context.signup("not-an-email", "pw123").await;
        assert_eq!(response.status().as_u16(), 400);

        let response = context
            .client
            .post(context.url("/signup"))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Failed to read body");
    }

    #[tokio::test]
    async fn test_forged_and_garbage_tokens_are_unauthorized() {
        let context = TestContext::new().await;
        context.signup("alice@example.com", "pw123").await;
        context.login("alice@example.com", "pw123").await;
        let me: Value = context
            .client
            .get(context.url("/me"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        // a token for the same user from a server with another secret
        let other = AppState::in_memory(Config::in_memory(b"some-other-secret"));
        let principal = other
            .verifier
            .register("alice@example.com", "pw123", None)
            .await
            .unwrap();
        let mut forged_claims = principal;
        forged_claims.id = me["id"].as_str().unwrap().parse().unwrap();
        let forged = other.tokens.issue(&forged_claims).unwrap();

        for token in [forged.token.as_str(), "garbage", ""] {
            let response = reqwest::Client::new()
                .get(context.url("/me"))
                .header("Cookie", format!("Authorization={}", token))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 401, "token {:?} was accepted", token);
        }
    }

    #[tokio::test]
    async fn test_logout_clears_the_cookie() {
        let context = TestContext::new().await;
        context.signup("alice@example.com", "pw123").await;
        context.login("alice@example.com", "pw123").await;
        assert_eq!(
            context.client.get(context.url("/me")).send().await.unwrap().status().as_u16(),
            200
        );

        let response = context.client.post(context.url("/logout")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);

        assert_eq!(
            context.client.get(context.url("/me")).send().await.unwrap().status().as_u16(),
            401
        );
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let context = TestContext::new().await;
        let response = context.client.get(context.url("/health")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
