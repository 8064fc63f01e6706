//! Client for the login handshake and authenticated request dispatch.
//!
//! `AccessClient` obtains a bearer token from the credential endpoint,
//! stores it through the supplied `SessionStore`, and carries it on every
//! subsequent request. GET responses are full rendered pages and are
//! handed to the supplied `Renderer`; other verbs are mutations whose
//! result is not a document.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{SessionData, SessionStore};
use crate::render::Renderer;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Body of an authenticated request.
///
/// `Json` payloads are encoded and tagged `application/json`; `Opaque`
/// bodies travel byte-identical with no content type forced, for multipart
/// or other pre-encoded data.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Opaque(Vec<u8>),
}

/// One outbound authenticated call.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    pub endpoint: String,
    pub method: Method,
    pub payload: Payload,
}

impl AuthenticatedRequest {
    pub fn new(endpoint: impl Into<String>, method: Method, payload: Payload) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload,
        }
    }

    /// A page retrieval with no payload of interest.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Method::GET, Payload::Json(Value::Null))
    }
}

/// Client for the login handshake and authenticated dispatch.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AccessClient {
    client: Client,
}

impl AccessClient {
    /// Create a new client with the default request timeout.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }

    /// Log in against `endpoint` and store the issued token in `session`.
    ///
    /// Returns `true` when a token was obtained and saved. Every failure
    /// (rejected credentials, transport error, unusable response) is
    /// logged and reported as `false`; the session keeps its prior state.
    pub async fn login(
        &self,
        session: &mut dyn SessionStore,
        endpoint: &str,
        username: &str,
        password: &str,
    ) -> bool {
        match self.request_token(endpoint, username, password).await {
            Ok(token) => {
                session.save(SessionData::new(token, username.to_string()));
                debug!(username, "login succeeded, token stored");
                true
            }
            Err(e) => {
                error!(error = %e, "login failed");
                false
            }
        }
    }

    /// POST the credential form and extract the issued token.
    async fn request_token(
        &self,
        endpoint: &str,
        username: &str,
        password: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(endpoint)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("Failed to send login request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %body, "login endpoint rejected credentials");
            return Err(ApiError::login_rejected(status, &body).into());
        }

        let body = response
            .text()
            .await
            .context("Failed to read login response")?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))?;

        Ok(token.access_token)
    }

    /// Send one authenticated request, rendering the response for GET.
    ///
    /// Fire-and-forget from the caller's perspective: every failure is
    /// caught and logged here. With no stored token the request is dropped
    /// before any I/O happens.
    pub async fn access(
        &self,
        session: &dyn SessionStore,
        renderer: &mut dyn Renderer,
        endpoint: &str,
        method: Method,
        payload: Payload,
    ) {
        self.dispatch(
            session,
            renderer,
            AuthenticatedRequest::new(endpoint, method, payload),
        )
        .await
    }

    /// `access` in value-object form.
    pub async fn dispatch(
        &self,
        session: &dyn SessionStore,
        renderer: &mut dyn Renderer,
        request: AuthenticatedRequest,
    ) {
        let Some(token) = session.current() else {
            warn!(
                endpoint = %request.endpoint,
                "{}", ApiError::MissingToken
            );
            return;
        };

        if let Err(e) = self.send_authenticated(token, renderer, &request).await {
            error!(error = %e, endpoint = %request.endpoint, "authenticated request failed");
        }
    }

    async fn send_authenticated(
        &self,
        token: &str,
        renderer: &mut dyn Renderer,
        request: &AuthenticatedRequest,
    ) -> Result<()> {
        let builder = self
            .client
            .request(request.method.clone(), &request.endpoint)
            .bearer_auth(token);

        let builder = match &request.payload {
            Payload::Json(value) => builder.json(value),
            Payload::Opaque(bytes) => builder.body(bytes.clone()),
        };

        let response = builder.send().await.with_context(|| {
            format!(
                "Failed to send {} request to {}",
                request.method, request.endpoint
            )
        })?;

        // Status is not consulted for rendering: whatever page the server
        // sent back for a GET is the page to show.
        debug!(status = %response.status(), endpoint = %request.endpoint, "response received");

        if request.method == Method::GET {
            let text = response
                .text()
                .await
                .context("Failed to read response body")?;
            renderer.replace_document(&text);
            renderer.push_history(&request.endpoint);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::render::{DiscardRenderer, Document};
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn login_success_stores_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "alice".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok123", "token_type": "bearer"}"#)
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        let url = format!("{}/auth", server.url());

        assert!(client.login(&mut session, &url, "alice", "secret").await);
        m.assert_async().await;
        assert_eq!(session.current(), Some("tok123"));
        assert_eq!(session.data().map(|d| d.username.as_str()), Some("alice"));
    }

    #[tokio::test]
    async fn login_rejection_leaves_session_absent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth")
            .with_status(401)
            .with_body("invalid credentials")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        let url = format!("{}/auth", server.url());

        assert!(!client.login(&mut session, &url, "alice", "wrong").await);
        m.assert_async().await;
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn login_rejection_keeps_prior_token() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(401)
            .with_body("invalid credentials")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("earlier".into(), "alice".into()));
        let url = format!("{}/auth", server.url());

        assert!(!client.login(&mut session, &url, "alice", "wrong").await);
        assert_eq!(session.current(), Some("earlier"));
    }

    #[tokio::test]
    async fn login_malformed_response_returns_false() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body("<html>definitely not json</html>")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        let url = format!("{}/auth", server.url());

        assert!(!client.login(&mut session, &url, "alice", "secret").await);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn login_transport_failure_returns_false() {
        // Nothing listens on port 9; the connection is refused.
        let client = AccessClient::new().unwrap();
        let mut session = Session::new();

        let ok = client
            .login(&mut session, "http://127.0.0.1:9/auth", "alice", "secret")
            .await;
        assert!(!ok);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn access_without_session_sends_nothing() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/items")
            .expect(0)
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let session = Session::new();
        let mut doc = Document::new();
        let url = format!("{}/items", server.url());

        client
            .access(
                &session,
                &mut doc,
                &url,
                Method::POST,
                Payload::Json(serde_json::json!({"x": 1})),
            )
            .await;

        m.assert_async().await;
        assert_eq!(doc.html(), "");
        assert!(doc.history().is_empty());
    }

    #[tokio::test]
    async fn get_replaces_document_and_pushes_history() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/items")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_body("<html>OK</html>")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("tok123".into(), "alice".into()));
        let mut doc = Document::new();
        let url = format!("{}/items", server.url());

        client
            .dispatch(&session, &mut doc, AuthenticatedRequest::get(&url))
            .await;

        m.assert_async().await;
        assert_eq!(doc.html(), "<html>OK</html>");
        assert_eq!(doc.history(), &[url.clone()]);
        assert_eq!(doc.location(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn json_payload_is_encoded_and_tagged() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/items")
            .match_header("authorization", "Bearer tok123")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({"x": 1})))
            .with_status(200)
            .with_body("<html>created</html>")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("tok123".into(), "alice".into()));
        let mut doc = Document::new();
        let url = format!("{}/items", server.url());

        client
            .access(
                &session,
                &mut doc,
                &url,
                Method::POST,
                Payload::Json(serde_json::json!({"x": 1})),
            )
            .await;

        m.assert_async().await;
        // Mutation responses are not pages; the document stays untouched.
        assert_eq!(doc.html(), "");
        assert!(doc.history().is_empty());
    }

    #[tokio::test]
    async fn opaque_payload_travels_unmodified() {
        let body = "field=1&blob=ZGF0YQ==";
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/upload")
            .match_header("authorization", "Bearer tok123")
            .match_header("content-type", Matcher::Missing)
            .match_body(Matcher::Exact(body.to_string()))
            .with_status(200)
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("tok123".into(), "alice".into()));
        let mut renderer = DiscardRenderer;
        let url = format!("{}/upload", server.url());

        client
            .access(
                &session,
                &mut renderer,
                &url,
                Method::POST,
                Payload::Opaque(body.as_bytes().to_vec()),
            )
            .await;

        m.assert_async().await;
    }

    #[tokio::test]
    async fn access_transport_failure_leaves_document_untouched() {
        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("tok123".into(), "alice".into()));
        let mut doc = Document::new();

        client
            .access(
                &session,
                &mut doc,
                "http://127.0.0.1:9/items",
                Method::GET,
                Payload::Json(Value::Null),
            )
            .await;

        assert_eq!(doc.html(), "");
        assert!(doc.history().is_empty());
    }

    #[tokio::test]
    async fn get_renders_whatever_the_server_sent() {
        // Dispatch does not branch on HTTP status; an error page is
        // still a page.
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/items")
            .with_status(403)
            .with_body("<html>forbidden</html>")
            .create_async()
            .await;

        let client = AccessClient::new().unwrap();
        let mut session = Session::new();
        session.save(SessionData::new("tok123".into(), "alice".into()));
        let mut doc = Document::new();
        let url = format!("{}/items", server.url());

        client
            .access(&session, &mut doc, &url, Method::GET, Payload::Json(Value::Null))
            .await;

        assert_eq!(doc.html(), "<html>forbidden</html>");
    }
}
