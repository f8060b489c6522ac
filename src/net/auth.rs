//! Account registration and session login/logout against the chat server.
//!
//! The server hands out a `session_token` cookie on `POST /login`; both the
//! history endpoint and the WebSocket handshake expect it back.

use std::fmt;

use log::{info, warn};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Serialize;

use crate::net::history_client::{SESSION_COOKIE, session_cookie};

#[derive(Debug)]
pub enum AuthError {
    Network(String),
    InvalidCredentials,
    Api { status: u16, message: String },
    /// Login succeeded but no session cookie came back.
    MissingCookie,
    /// Registration form is incomplete; checked before anything is sent.
    MissingFields,
    /// Email or nickname is already registered.
    AlreadyTaken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(msg) => write!(f, "network error: {msg}"),
            AuthError::InvalidCredentials => write!(f, "invalid email/nickname or password"),
            AuthError::Api { status, message } => {
                write!(f, "auth API error (HTTP {status}): {message}")
            }
            AuthError::MissingCookie => write!(f, "server did not return a session cookie"),
            AuthError::MissingFields => {
                write!(f, "nickname, email, password and a positive age are required")
            }
            AuthError::AlreadyTaken => write!(f, "email or nickname already taken"),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// A new account, as `POST /register` expects it.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Registration {
    pub nickname: String,
    pub age: u32,
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Trim the identifying fields and reject an incomplete form.
    pub fn normalized(&self) -> Result<Registration, AuthError> {
        let form = Registration {
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
            ..self.clone()
        };
        if form.nickname.is_empty() || form.email.is_empty() || form.password.is_empty() || form.age == 0 {
            return Err(AuthError::MissingFields);
        }
        Ok(form)
    }
}

/// Create an account. The server does not log the new user in.
pub async fn register(base_url: &str, registration: &Registration) -> Result<(), AuthError> {
    let form = registration.normalized()?;
    let url = format!("{}/register", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&form)
        .send()
        .await
        .map_err(|e| AuthError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::CONFLICT {
        warn!("Registration refused for {}: already taken", form.nickname);
        return Err(AuthError::AlreadyTaken);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::Api {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }
    info!("Registered {}", form.nickname);
    Ok(())
}

/// Pull the session token out of a `Set-Cookie` header value.
pub fn token_from_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
}

/// Log in with an email or nickname. Returns the session token.
pub async fn login(base_url: &str, identifier: &str, password: &str) -> Result<String, AuthError> {
    let url = format!("{}/login", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&LoginRequest {
            identifier,
            password,
        })
        .send()
        .await
        .map_err(|e| AuthError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!("Login rejected for {}", identifier);
        return Err(AuthError::InvalidCredentials);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::Api {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }

    let token = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_set_cookie)
        .ok_or(AuthError::MissingCookie)?;
    info!("Logged in as {}", identifier);
    Ok(token)
}

/// End the session server-side.
pub async fn logout(base_url: &str, token: &str) -> Result<(), AuthError> {
    let url = format!("{}/logout", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .header(COOKIE, session_cookie(token))
        .send()
        .await
        .map_err(|e| AuthError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::Api {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }
    info!("Logged out");
    Ok(())
}
