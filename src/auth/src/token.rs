// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Types and functions to work with auth [Tokens].
//!
//! [Tokens]: https://cloud.google.com/docs/authentication#token

use crate::Result;
use crate::constants::DEFAULT_TOKEN_TYPE;
use time::OffsetDateTime;

/// The credentials held by a single credential variant.
///
/// All fields are optional: a freshly created variant holds no access token
/// and refreshes on first use. A token without an `expiry_date` never
/// expires.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token {
    /// The access token, used in the `Authorization:` header.
    pub access_token: Option<String>,

    /// The refresh token.
    ///
    /// Variants that mint tokens without a refresh token (service accounts
    /// and the metadata server) hold a placeholder value.
    pub refresh_token: Option<String>,

    /// When the access token expires, in milliseconds since the Unix epoch.
    pub expiry_date: Option<i64>,

    /// The type of the token, almost always `"Bearer"`.
    pub token_type: Option<String>,

    /// An OpenID Connect ID token, if the token endpoint returned one.
    pub id_token: Option<String>,
}

impl Token {
    /// Creates a token holding only an access token, without expiration.
    pub fn from_access_token<T: Into<String>>(access_token: T) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    /// Returns `true` if the token has an expiration time, and it is in
    /// the past.
    pub fn is_expired(&self) -> bool {
        self.expiry_date.is_some_and(|e| now_millis() >= e)
    }

    // A refresh is needed when there is no access token, or it has expired.
    pub(crate) fn needs_refresh(&self) -> bool {
        self.access_token.is_none() || self.is_expired()
    }

    pub(crate) fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or(DEFAULT_TOKEN_TYPE)
    }

    /// Applies a token endpoint response to the current credentials.
    ///
    /// The refresh token is kept unless the response carries a new one.
    pub(crate) fn merge(self, response: TokenResponse) -> Token {
        let Token {
            refresh_token,
            id_token,
            ..
        } = self;
        let mut updated = response.into_token();
        updated.refresh_token = updated.refresh_token.or(refresh_token);
        updated.id_token = updated.id_token.or(id_token);
        updated
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &self.access_token.as_ref().map(|_| "[censored]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[censored]"),
            )
            .field("expiry_date", &self.expiry_date)
            .field("token_type", &self.token_type)
            .field("id_token", &self.id_token.as_ref().map(|_| "[censored]"))
            .finish()
    }
}

/// The milliseconds elapsed since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// The response from a token endpoint or the metadata server.
#[derive(Clone, Default, PartialEq, serde::Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
    #[serde(default)]
    pub(crate) token_type: Option<String>,
    #[serde(default)]
    pub(crate) id_token: Option<String>,
}

impl TokenResponse {
    /// Converts a relative `expires_in` to an absolute `expiry_date`.
    pub(crate) fn into_token(self) -> Token {
        let expiry_date = self
            .expires_in
            .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX))
            .map(|secs| now_millis().saturating_add(secs.saturating_mul(1000)));
        Token {
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token,
            expiry_date,
            token_type: Some(
                self.token_type
                    .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            ),
            id_token: self.id_token,
        }
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[censored]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Performs the variant-specific refresh: sign an assertion, call a token
/// endpoint, or query the metadata server.
#[async_trait::async_trait]
pub(crate) trait TokenProvider: std::fmt::Debug + Send + Sync {
    async fn refresh(&self, current: &Token) -> Result<TokenResponse>;
}
