//! OAuth 2.0 credentials for the Sheets API
//!
//! Tokens are persisted to a JSON file in the same layout Google's Python
//! client writes (`token`, `refresh_token`, `token_uri`, `client_id`,
//! `client_secret`, `scopes`, `expiry`), so an existing `token.json` keeps
//! working. When no usable token exists the installed-application loopback flow
//! runs against the client secret file downloaded from the Cloud console.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid {what}: {source}")]
    Parse {
        path: PathBuf,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("client secret file {0} has neither an 'installed' nor a 'web' section")]
    MissingClientSection(PathBuf),
    #[error("token endpoint rejected the request: {0}")]
    TokenEndpoint(String),
    #[error("authorization was denied: {0}")]
    Denied(String),
    #[error("invalid authorization redirect: {0}")]
    Redirect(String),
    #[error("loopback listener failed: {0}")]
    Listener(#[source] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Where credentials live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    /// OAuth client secret downloaded from the Cloud console
    pub client_secret: PathBuf,
    /// Persisted access/refresh token
    pub token: PathBuf,
}

/// A persisted OAuth token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

impl TokenInfo {
    /// Usable without a refresh at `now`. Tokens without an expiry never expire.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty()
            && self
                .expiry
                .is_none_or(|expiry| expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > now)
    }

    /// Whether the token was granted every requested scope
    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes.iter().all(|s| self.scopes.iter().any(|have| have == s))
    }

    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = response.access_token;
        self.expiry = response.expires_in.map(|secs| now + Duration::seconds(secs));
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    installed: Option<ClientSecret>,
    #[serde(default)]
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Obtain a token valid for `scopes`
///
/// Uses the persisted token when still valid, refreshes it when expired, and
/// falls back to interactive authorization otherwise. Any new or refreshed
/// token is written back to `paths.token`.
pub async fn authorize(paths: &CredentialPaths, scopes: &[&str]) -> Result<TokenInfo, AuthError> {
    let http = reqwest::Client::new();

    if let Some(mut token) = load_token(&paths.token)?.filter(|t| t.covers(scopes)) {
        if token.is_valid(Utc::now()) {
            log::debug!("Using stored token from {}", paths.token.display());
            return Ok(token);
        }

        if let Some(refresh_token) = token.refresh_token.clone() {
            log::info!("Stored token expired, refreshing");
            let response = request_token(
                &http,
                &token.token_uri,
                &[
                    ("client_id", token.client_id.as_str()),
                    ("client_secret", token.client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await?;
            token.apply(response, Utc::now());
            save_token(&paths.token, &token)?;
            return Ok(token);
        }
    }

    let secret = load_client_secret(&paths.client_secret)?;
    let token = run_loopback_flow(&http, &secret, scopes).await?;
    save_token(&paths.token, &token)?;
    Ok(token)
}

fn load_token(path: &Path) -> Result<Option<TokenInfo>, AuthError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match serde_json::from_str(&content) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            log::warn!("Ignoring unreadable token file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn save_token(path: &Path, token: &TokenInfo) -> Result<(), AuthError> {
    let content = serde_json::to_string_pretty(token).map_err(|source| AuthError::Parse {
        path: path.to_path_buf(),
        what: "token",
        source,
    })?;
    fs::write(path, content).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Saved token to {}", path.display());
    Ok(())
}

fn load_client_secret(path: &Path) -> Result<ClientSecret, AuthError> {
    let content = fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ClientSecretFile =
        serde_json::from_str(&content).map_err(|source| AuthError::Parse {
            path: path.to_path_buf(),
            what: "client secret file",
            source,
        })?;

    file.installed
        .or(file.web)
        .ok_or_else(|| AuthError::MissingClientSection(path.to_path_buf()))
}

async fn request_token(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = http.post(token_uri).form(form).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{}: {}", err.error, description),
                None => err.error,
            },
            Err(_) => format!("HTTP {} - {}", status, body.trim()),
        };
        return Err(AuthError::TokenEndpoint(message));
    }

    serde_json::from_str(&body).map_err(|e| AuthError::TokenEndpoint(e.to_string()))
}

fn consent_url(secret: &ClientSecret, redirect_uri: &str, scopes: &[&str], state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
        secret.auth_uri,
        urlencoding::encode(&secret.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        urlencoding::encode(state),
    )
}

/// Read the HTTP request line, however many segments it arrives in
async fn read_request_line<R: AsyncRead + Unpin>(stream: R) -> std::io::Result<String> {
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).await?;
    Ok(line)
}

/// Extract the authorization code from the redirect's HTTP request
///
/// Returns `Ok(None)` for requests that carry neither a code nor an error,
/// such as the browser asking for `/favicon.ico`.
fn parse_redirect(request: &str, expected_state: &str) -> Result<Option<String>, AuthError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| AuthError::Redirect("empty request".to_string()))?;

    let Some((_, query)) = target.split_once('?') else {
        return Ok(None);
    };

    let mut code = None;
    let mut state = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map_err(|e| AuthError::Redirect(e.to_string()))?
            .into_owned();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => return Err(AuthError::Denied(value)),
            _ => {}
        }
    }

    match code {
        None => Ok(None),
        Some(_) if state.as_deref() != Some(expected_state) => {
            Err(AuthError::Redirect("state mismatch".to_string()))
        }
        Some(code) => Ok(Some(code)),
    }
}

async fn run_loopback_flow(
    http: &reqwest::Client,
    secret: &ClientSecret,
    scopes: &[&str],
) -> Result<TokenInfo, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(AuthError::Listener)?;
    let port = listener.local_addr().map_err(AuthError::Listener)?.port();
    let redirect_uri = format!("http://127.0.0.1:{}/", port);
    let state = format!("{:016x}", rand::random::<u64>());

    println!(
        "Please visit this URL to authorize this application:\n{}",
        consent_url(secret, &redirect_uri, scopes, &state)
    );

    let code = loop {
        let (mut stream, _) = listener.accept().await.map_err(AuthError::Listener)?;
        let request = read_request_line(&mut stream)
            .await
            .map_err(AuthError::Listener)?;

        let outcome = parse_redirect(&request, &state);
        let page = match &outcome {
            Ok(Some(_)) => "The authentication flow has completed. You may close this window.",
            Ok(None) => "",
            Err(_) => "Authorization failed. Return to the terminal for details.",
        };
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            page.len(),
            page
        );
        // The browser closing early does not affect the flow
        let _ = stream.write_all(reply.as_bytes()).await;

        if let Some(code) = outcome? {
            break code;
        }
    };

    let response = request_token(
        http,
        &secret.token_uri,
        &[
            ("code", code.as_str()),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;

    let mut token = TokenInfo {
        token: String::new(),
        refresh_token: None,
        token_uri: secret.token_uri.clone(),
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
        expiry: None,
    };
    token.apply(response, Utc::now());
    Ok(token)
}
