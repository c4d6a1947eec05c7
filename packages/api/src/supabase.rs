//! # Supabase client: auth and the component table over HTTP
//!
//! [`SupabaseClient`] implements [`AuthSource`] and [`ComponentTable`] against a
//! hosted Supabase project using `reqwest`.
//!
//! ## Auth (GoTrue, `/auth/v1`)
//!
//! - **Sign-in** is the OAuth implicit flow. [`oauth_url`](AuthSource::oauth_url)
//!   builds `/authorize?provider=…&redirect_to=…`; the provider sends the browser
//!   back with `#access_token=…&refresh_token=…&expires_in=…` in the fragment.
//!   [`session_from_url`](SupabaseClient::session_from_url) turns that fragment into
//!   a [`Session`] by fetching `/user`, then emits `SIGNED_IN`.
//! - **get_session** returns the locally held session. On the web it first picks up
//!   a pending redirect fragment. An access token within [`EXPIRY_MARGIN_SECS`] of
//!   expiry is refreshed once via `/token?grant_type=refresh_token` (`TOKEN_REFRESHED`);
//!   a failed refresh clears the session (`SIGNED_OUT`).
//! - **sign_out** calls `/logout` and clears the local session whatever the server says.
//!
//! ## Table (PostgREST, `/rest/v1`)
//!
//! `insert` posts a one-element array with `Prefer: return=minimal`; `select_all`
//! issues `GET ?select=*`. Requests carry the `apikey` header and the session's
//! bearer token, or the anon key when signed out. The token goes through the same
//! expiry check as `get_session`, so a stale token is refreshed before the request.
//!
//! ## Errors
//!
//! Non-2xx responses become a [`RemoteError`] built from the body
//! (`{message, code, …}` from PostgREST, `{error_description | msg}` from GoTrue),
//! with the HTTP status as the code when the body has none. Transport failures map
//! to a `RemoteError` carrying the `reqwest` message.

use std::cell::RefCell;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use store::{
    AuthCallback, AuthChangeEvent, AuthListeners, AuthSource, ComponentRow, ComponentTable,
    Identity, NewComponent, RemoteError, Session, Subscription,
};

use crate::config::SupabaseConfig;
use crate::persist;

/// Refresh an access token this many seconds before it expires.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// Tokens carried in the OAuth redirect fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// GoTrue error bodies use different field names than PostgREST.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    error_code: Option<String>,
}

/// HTTP client for a Supabase project.
pub struct SupabaseClient {
    config: SupabaseConfig,
    http: Client,
    session: RefCell<Option<Session>>,
    listeners: AuthListeners,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            session: RefCell::new(persist::load_session()),
            listeners: AuthListeners::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path.trim_start_matches('/'))
    }

    fn table_endpoint(&self) -> String {
        self.endpoint(&format!("rest/v1/{}", self.config.table))
    }

    /// Token for table requests: the session's access token, refreshed first
    /// if it is about to expire, or the anon key when signed out.
    async fn bearer(&self) -> Result<String, RemoteError> {
        Ok(match self.current_session().await? {
            Some(session) => session.access_token,
            None => self.config.anon_key.clone(),
        })
    }

    /// The stored session, refreshed when it is within [`EXPIRY_MARGIN_SECS`]
    /// of expiring. A failed refresh signs the user out.
    async fn current_session(&self) -> Result<Option<Session>, RemoteError> {
        let current = self.session.borrow().clone();
        let Some(current) = current else {
            return Ok(None);
        };
        if !current.is_expired(persist::now_secs(), EXPIRY_MARGIN_SECS) {
            return Ok(Some(current));
        }

        tracing::debug!("Access token expired, refreshing");
        match self.refresh(&current.refresh_token).await {
            Ok(session) => {
                self.store_session(Some(session.clone()), AuthChangeEvent::TokenRefreshed);
                Ok(Some(session))
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                self.store_session(None, AuthChangeEvent::SignedOut);
                Err(e)
            }
        }
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    fn store_session(&self, session: Option<Session>, event: AuthChangeEvent) {
        persist::save_session(session.as_ref());
        *self.session.borrow_mut() = session.clone();
        self.listeners.emit(event, session.as_ref());
    }

    /// Complete an OAuth redirect. Returns `Ok(None)` when `url` carries no tokens.
    pub async fn session_from_url(&self, url: &str) -> Result<Option<Session>, RemoteError> {
        let Some(tokens) = parse_redirect(url)? else {
            return Ok(None);
        };

        let response = self
            .authorized(self.http.get(self.endpoint("auth/v1/user")), &tokens.access_token)
            .send()
            .await
            .map_err(transport)?;
        let user: Identity = parse_json(response).await?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            expires_at: Some(expires_at(tokens.expires_in)),
            user,
        };
        tracing::info!(user = %session.user.display_name(), "Signed in");
        self.store_session(Some(session.clone()), AuthChangeEvent::SignedIn);
        Ok(Some(session))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, RemoteError> {
        let response = self
            .authorized(
                self.http
                    .post(self.endpoint("auth/v1/token?grant_type=refresh_token")),
                &self.config.anon_key,
            )
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport)?;
        let mut session: Session = parse_json(response).await?;
        if session.expires_at.is_none() {
            session.expires_at = Some(expires_at(session.expires_in));
        }
        Ok(session)
    }
}

#[async_trait(?Send)]
impl AuthSource for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        if let Some(url) = persist::take_redirect_url() {
            if let Some(session) = self.session_from_url(&url).await? {
                return Ok(Some(session));
            }
        }
        self.current_session().await
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    fn oauth_url(&self, provider: &str) -> Result<String, RemoteError> {
        let mut params = vec![("provider", provider.to_string())];
        if let Some(redirect_to) = &self.config.redirect_to {
            params.push(("redirect_to", redirect_to.clone()));
        }
        let url = Url::parse_with_params(&self.endpoint("auth/v1/authorize"), &params)
            .map_err(|e| RemoteError::new(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let token = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone());

        let result = match token {
            Some(token) => {
                let response = self
                    .authorized(self.http.post(self.endpoint("auth/v1/logout")), &token)
                    .send()
                    .await
                    .map_err(transport);
                match response {
                    Ok(response) => check_status(response).await,
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };
        if let Err(e) = &result {
            tracing::warn!("Remote sign-out failed, clearing local session anyway: {}", e);
        }

        self.store_session(None, AuthChangeEvent::SignedOut);
        result
    }
}

#[async_trait(?Send)]
impl ComponentTable for SupabaseClient {
    async fn insert(&self, row: &NewComponent) -> Result<(), RemoteError> {
        let token = self.bearer().await?;
        let response = self
            .authorized(self.http.post(self.table_endpoint()), &token)
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await
    }

    async fn select_all(&self) -> Result<Vec<ComponentRow>, RemoteError> {
        let token = self.bearer().await?;
        let response = self
            .authorized(self.http.get(self.table_endpoint()), &token)
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(transport)?;
        parse_json(response).await
    }
}

/// Extract tokens from an OAuth redirect URL fragment.
///
/// `Ok(None)` when the fragment has no access token; `Err` when the provider
/// reported an error.
pub fn parse_redirect(url: &str) -> Result<Option<RedirectTokens>, RemoteError> {
    let Some((_, fragment)) = url.split_once('#') else {
        return Ok(None);
    };
    // Reuse the query parser for the fragment's form encoding.
    let mut scratch = Url::parse("http://localhost/").map_err(|e| RemoteError::new(e.to_string()))?;
    scratch.set_query(Some(fragment));

    let mut access_token = None;
    let mut refresh_token = String::new();
    let mut token_type = "bearer".to_string();
    let mut expires_in = 3600;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in scratch.query_pairs() {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = value.into_owned(),
            "token_type" => token_type = value.into_owned(),
            "expires_in" => expires_in = value.parse().unwrap_or(expires_in),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(code) = error {
        let message = error_description.unwrap_or_else(|| code.clone());
        return Err(RemoteError::new(message).with_code(code));
    }

    Ok(access_token.map(|access_token| RedirectTokens {
        access_token,
        refresh_token,
        token_type,
        expires_in,
    }))
}

/// Absolute expiry for a token lifetime; saturates on absurd `expires_in` values.
fn expires_at(expires_in: i64) -> i64 {
    persist::now_secs().saturating_add(expires_in)
}

fn transport(e: reqwest::Error) -> RemoteError {
    let error = RemoteError::new(e.to_string());
    match e.status() {
        Some(status) => error.with_code(status.as_str()),
        None => error,
    }
}

/// Build a [`RemoteError`] from an error response body.
pub fn error_from_body(status: u16, body: &str) -> RemoteError {
    if let Ok(error) = serde_json::from_str::<RemoteError>(body) {
        if error.code.is_some() {
            return error;
        }
        return error.with_code(status.to_string());
    }
    if let Ok(body) = serde_json::from_str::<AuthErrorBody>(body) {
        if let Some(message) = body.error_description.or(body.msg).or(body.error.clone()) {
            let code = body
                .error_code
                .or(body.error)
                .unwrap_or_else(|| status.to_string());
            return RemoteError::new(message).with_code(code);
        }
    }
    let message = if body.trim().is_empty() {
        format!("request failed with status {}", status)
    } else {
        body.trim().to_string()
    };
    RemoteError::new(message).with_code(status.to_string())
}

async fn check_status(response: Response) -> Result<(), RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_body(status.as_u16(), &body));
    }
    response.json::<T>().await.map_err(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url: "https://demo.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            provider: "github".to_string(),
            redirect_to: Some("http://localhost:8080/".to_string()),
            table: "components".to_string(),
        })
    }

    #[test]
    fn test_parse_redirect_tokens() {
        let tokens = parse_redirect(
            "http://localhost:8080/#access_token=abc.def&expires_in=7200&refresh_token=r1&token_type=bearer",
        )
        .unwrap()
        .unwrap();
        assert_eq!(tokens.access_token, "abc.def");
        assert_eq!(tokens.refresh_token, "r1");
        assert_eq!(tokens.expires_in, 7200);
    }

    #[test]
    fn test_parse_redirect_without_fragment() {
        assert_eq!(parse_redirect("http://localhost:8080/").unwrap(), None);
        assert_eq!(parse_redirect("http://localhost:8080/#section").unwrap(), None);
    }

    #[test]
    fn test_parse_redirect_error() {
        let err = parse_redirect(
            "http://localhost:8080/#error=access_denied&error_description=User+denied+access",
        )
        .unwrap_err();
        assert_eq!(err.message, "User denied access");
        assert_eq!(err.code.as_deref(), Some("access_denied"));
    }

    #[test]
    fn test_error_from_postgrest_body() {
        let err = error_from_body(
            409,
            r#"{"code":"23505","details":"Key exists","hint":null,"message":"duplicate key value"}"#,
        );
        assert_eq!(err.message, "duplicate key value");
        assert_eq!(err.code.as_deref(), Some("23505"));
        assert_eq!(err.details.as_deref(), Some("Key exists"));
    }

    #[test]
    fn test_error_from_gotrue_body() {
        let err = error_from_body(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#,
        );
        assert_eq!(err.message, "Invalid Refresh Token");
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
    }

    #[test]
    fn test_error_from_plain_body() {
        let err = error_from_body(502, "");
        assert_eq!(err.message, "request failed with status 502");
        assert_eq!(err.code.as_deref(), Some("502"));
    }

    #[test]
    fn test_oauth_url() {
        let url = client().oauth_url("github").unwrap();
        assert_eq!(
            url,
            "https://demo.supabase.co/auth/v1/authorize?provider=github&redirect_to=http%3A%2F%2Flocalhost%3A8080%2F"
        );
    }

    #[test]
    fn test_table_endpoint() {
        assert_eq!(
            client().table_endpoint(),
            "https://demo.supabase.co/rest/v1/components"
        );
    }

    #[tokio::test]
    async fn test_signed_out_client_has_no_session() {
        let client = client();
        assert_eq!(client.get_session().await.unwrap(), None);
        assert_eq!(client.bearer().await.unwrap(), "anon");
    }

    #[tokio::test]
    async fn test_sign_out_without_session_notifies_listeners() {
        use std::cell::Cell;

        let client = client();
        let events = Rc::new(Cell::new(0));
        let counter = events.clone();
        let _sub = client.on_auth_state_change(Rc::new(
            move |event: AuthChangeEvent, session: Option<&Session>| {
                assert_eq!(event, AuthChangeEvent::SignedOut);
                assert!(session.is_none());
                counter.set(counter.get() + 1);
            },
        ));

        client.sign_out().await.unwrap();
        assert_eq!(events.get(), 1);
    }

    /// Request lines and `Authorization` headers seen by a [`serve`] stub.
    type Seen = Arc<Mutex<Vec<(String, String)>>>;

    /// Answer each request whose path starts with a route prefix with that
    /// route's status and JSON body, one request per connection.
    async fn serve(routes: Vec<(&'static str, u16, String)>) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen: Seen = Arc::default();
        let log = seen.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_end = loop {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break None;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break Some(pos + 4);
                    }
                };
                let Some(head_end) = head_end else { continue };
                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let header = |name: &str| {
                    head.lines().find_map(|line| {
                        let (key, value) = line.split_once(':')?;
                        key.eq_ignore_ascii_case(name).then(|| value.trim().to_string())
                    })
                };
                let length: usize = header("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                while buf.len() < head_end + length {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let request_line = head.lines().next().unwrap_or_default().to_string();
                let path = request_line.split_whitespace().nth(1).unwrap_or_default().to_string();
                log.lock()
                    .unwrap()
                    .push((request_line, header("authorization").unwrap_or_default()));

                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| path.starts_with(prefix))
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, String::new()));
                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });

        (base, seen)
    }

    fn local_client(base: &str) -> SupabaseClient {
        let mut client = SupabaseClient::new(SupabaseConfig {
            url: base.to_string(),
            anon_key: "anon".to_string(),
            provider: "github".to_string(),
            redirect_to: None,
            table: "components".to_string(),
        });
        client.http = Client::builder().no_proxy().build().unwrap();
        client
    }

    fn session(access_token: &str, expires_at: i64) -> Session {
        Session {
            access_token: access_token.to_string(),
            refresh_token: "r1".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(expires_at),
            user: Identity {
                id: "u1".to_string(),
                email: None,
                app_metadata: Default::default(),
            },
        }
    }

    #[tokio::test]
    async fn test_session_from_url_saturates_huge_expiry() {
        let (base, _) = serve(vec![("/auth/v1/user", 200, r#"{"id":"u1"}"#.to_string())]).await;
        let client = local_client(&base);

        let session = client
            .session_from_url("http://localhost/#access_token=t&expires_in=9223372036854775807")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.expires_at, Some(i64::MAX));
        assert!(!session.is_expired(persist::now_secs(), EXPIRY_MARGIN_SECS));
        assert_eq!(client.get_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_insert_refreshes_expired_token_first() {
        let refreshed = r#"{"access_token":"fresh","refresh_token":"r2","token_type":"bearer","expires_in":3600,"user":{"id":"u1"}}"#;
        let (base, seen) = serve(vec![
            ("/auth/v1/token", 200, refreshed.to_string()),
            ("/rest/v1/components", 201, String::new()),
        ])
        .await;
        let client = local_client(&base);
        *client.session.borrow_mut() = Some(session("stale", persist::now_secs() - 60));

        let events = Rc::new(RefCell::new(Vec::new()));
        let log = events.clone();
        let _sub = client.on_auth_state_change(Rc::new(
            move |event: AuthChangeEvent, _: Option<&Session>| log.borrow_mut().push(event),
        ));

        let row = NewComponent {
            name: "Resistor".to_string(),
            quantity: 10,
            ..Default::default()
        };
        client.insert(&row).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].0.starts_with("POST /auth/v1/token"));
        assert_eq!(seen[0].1, "Bearer anon");
        assert!(seen[1].0.starts_with("POST /rest/v1/components"));
        assert_eq!(seen[1].1, "Bearer fresh");
        assert_eq!(*events.borrow(), vec![AuthChangeEvent::TokenRefreshed]);
        assert_eq!(
            client.session.borrow().as_ref().map(|s| s.access_token.clone()),
            Some("fresh".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_signs_out_before_select() {
        let (base, seen) = serve(vec![(
            "/auth/v1/token",
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#.to_string(),
        )])
        .await;
        let client = local_client(&base);
        *client.session.borrow_mut() = Some(session("stale", persist::now_secs() - 60));

        let err = client.select_all().await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
        assert!(client.session.borrow().is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
