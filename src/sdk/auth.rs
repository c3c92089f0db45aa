//! Authentication
//!
//! Exchanges OAuth2 password-grant credentials for an access token and wraps
//! it as the header attached to every later request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default header carrying the token
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Default prefix put in front of the token value
pub const DEFAULT_HEADER_PREFIX: &str = "Bearer";

/// Header name and value attached to authenticated requests
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    header_name: String,
    header_value: String,
}

impl AuthToken {
    pub fn new(header_name: impl Into<String>, header_value: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            header_value: header_value.into(),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        HeaderScheme::default().token(token)
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn header_value(&self) -> &str {
        &self.header_value
    }
}

// Security: keep token values out of logs
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("header_name", &self.header_name)
            .field("header_value", &"<redacted>")
            .finish()
    }
}

/// How an access token is turned into a request header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderScheme {
    pub name: String,
    /// Placed before the token with a single space; `None` sends the bare token
    pub prefix: Option<String>,
}

impl HeaderScheme {
    pub fn new(name: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            name: name.into(),
            prefix,
        }
    }

    pub fn token(&self, access_token: &str) -> AuthToken {
        let value = match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, access_token),
            _ => access_token.to_string(),
        };
        AuthToken::new(self.name.clone(), value)
    }
}

impl Default for HeaderScheme {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_NAME, Some(DEFAULT_HEADER_PREFIX.to_string()))
    }
}

/// Role requested in the password grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Public,
    Registered,
}

/// Form fields sent to the token endpoint
#[derive(Clone, Serialize)]
pub struct Credentials {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    scope: String,
    role: Role,
}

impl Credentials {
    /// Anonymous shopper in `scope`
    pub fn public(scope: impl Into<String>) -> Self {
        Self {
            grant_type: "password",
            username: None,
            password: None,
            scope: scope.into(),
            role: Role::Public,
        }
    }

    /// Registered user in `scope`
    pub fn registered(
        username: impl Into<String>,
        password: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "password",
            username: Some(username.into()),
            password: Some(password.into()),
            scope: scope.into(),
            role: Role::Registered,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("scope", &self.scope)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response; only the access token is used
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
}
