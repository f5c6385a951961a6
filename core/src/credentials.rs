//! Authentication material held by a client.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Exactly one form of credentials per client.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A long-lived `username:secret` API token, sent as `auth_token`.
    Token(String),
    /// Account password, sent as HTTP basic auth.
    Password { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(token.into())
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The account name: the token prefix before `:`, or the basic-auth user.
    pub fn username(&self) -> &str {
        match self {
            Credentials::Token(token) => token.split(':').next().unwrap_or(""),
            Credentials::Password { username, .. } => username,
        }
    }

    /// Query parameter carrying the token, if any.
    pub fn auth_token(&self) -> Option<&str> {
        match self {
            Credentials::Token(token) => Some(token),
            Credentials::Password { .. } => None,
        }
    }

    /// `Authorization` header value for password credentials.
    pub fn basic_auth(&self) -> Option<String> {
        match self {
            Credentials::Token(_) => None,
            Credentials::Password { username, password } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f
                .debug_tuple("Token")
                .field(&format_args!("{}:***", self.username()))
                .finish(),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
