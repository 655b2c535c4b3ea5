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

//! [User Account] credentials.
//!
//! User accounts represent a developer, administrator, or any other person
//! who interacts with Google APIs and services. These credentials hold an
//! OAuth2 refresh token, typically created by running
//! `gcloud auth application-default login`, and exchange it for access
//! tokens.
//!
//! ## Example
//!
//! ```
//! # use google_cloud_adc::credentials::user_account::Builder;
//! let authorized_user = serde_json::json!({
//!     "type": "authorized_user",
//!     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
//!     "client_secret": "YOUR_CLIENT_SECRET",
//!     "refresh_token": "YOUR_REFRESH_TOKEN",
//! });
//! let credentials = Builder::from_json(authorized_user)?.build()?;
//! # Ok::<(), google_cloud_adc::errors::CredentialsError>(())
//! ```
//!
//! [User Account]: https://cloud.google.com/docs/authentication#user-accounts

use crate::Result;
use crate::build_errors::Error as BuildError;
use crate::constants::OAUTH2_TOKEN_URI;
use crate::credentials::oauth2::RefreshTokenProvider;
use crate::credentials::{Credentials, CredentialsKind, CredentialsProvider};
use crate::token::Token;
use crate::token_cache::TokenHolder;
use crate::transport::{ReqwestTransporter, Transporter};
use http::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// The contents of an `authorized_user` credentials file.
#[derive(serde::Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct AuthorizedUser {
    /// The OAuth2 client id.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The refresh token.
    pub refresh_token: String,
    /// The token endpoint. Defaults to `https://oauth2.googleapis.com/token`.
    pub token_uri: Option<String>,
}

impl AuthorizedUser {
    fn validate(&self) -> std::result::Result<(), BuildError> {
        if self.client_id.is_empty() {
            return Err(BuildError::missing_field("client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(BuildError::missing_field("client_secret"));
        }
        if self.refresh_token.is_empty() {
            return Err(BuildError::missing_field("refresh_token"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// A builder for user [Credentials].
#[derive(Debug)]
pub struct Builder {
    user: AuthorizedUser,
    scopes: Option<Vec<String>>,
    transporter: Option<Arc<dyn Transporter>>,
}

impl Builder {
    /// Creates a builder from the fields of an `authorized_user` file.
    pub fn from_authorized_user(user: AuthorizedUser) -> Self {
        Self {
            user,
            scopes: None,
            transporter: None,
        }
    }

    /// Creates a builder from the JSON contents of an `authorized_user`
    /// file.
    pub fn from_json(json: Value) -> Result<Self> {
        let user = serde_json::from_value::<AuthorizedUser>(json).map_err(BuildError::parsing)?;
        Ok(Self::from_authorized_user(user))
    }

    /// Creates a builder from a stream with the contents of an
    /// `authorized_user` file.
    pub async fn from_stream<R: AsyncRead + Unpin>(reader: R) -> Result<Self> {
        Self::from_json(super::read_json(reader).await?)
    }

    /// Overrides the token endpoint.
    pub fn with_token_uri<S: Into<String>>(mut self, token_uri: S) -> Self {
        self.user.token_uri = Some(token_uri.into());
        self
    }

    /// Requests access tokens with these scopes.
    ///
    /// By default the access tokens have the scopes granted with the refresh
    /// token.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the transporter used to call the token endpoint.
    pub fn with_transporter(mut self, transporter: Arc<dyn Transporter>) -> Self {
        self.transporter = Some(transporter);
        self
    }

    /// Returns the configured [Credentials].
    ///
    /// # Errors
    /// Returns a configuration error if the client id, the client secret, or
    /// the refresh token are missing.
    pub fn build(self) -> Result<Credentials> {
        self.user.validate()?;
        let AuthorizedUser {
            client_id,
            client_secret,
            refresh_token,
            token_uri,
        } = self.user;
        let provider = RefreshTokenProvider {
            client_id,
            client_secret: Some(client_secret),
            scopes: self.scopes,
            token_uri: token_uri
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| OAUTH2_TOKEN_URI.to_string()),
            transporter: self
                .transporter
                .unwrap_or_else(|| Arc::new(ReqwestTransporter::new())),
        };
        let initial = Token {
            refresh_token: Some(refresh_token),
            ..Default::default()
        };
        Ok(UserCredentials {
            holder: Arc::new(TokenHolder::new(provider, initial)),
        }
        .into())
    }
}

#[derive(Clone, Debug)]
struct UserCredentials {
    holder: Arc<TokenHolder<RefreshTokenProvider>>,
}

impl CredentialsProvider for UserCredentials {
    fn kind(&self) -> CredentialsKind {
        CredentialsKind::UserRefresh
    }

    async fn access_token(&self) -> Result<String> {
        self.holder.access_token().await
    }

    async fn headers(&self, _uri: Option<&str>) -> Result<HeaderMap> {
        self.holder.headers().await
    }

    async fn refresh(&self) -> Result<Token> {
        self.holder.refresh().await
    }

    fn credentials(&self) -> Token {
        self.holder.current()
    }

    fn set_credentials(&self, token: Token) {
        self.holder.set(token)
    }

    fn create_scoped_required(&self) -> bool {
        false
    }

    fn create_scoped(&self, _scopes: Vec<String>) -> Credentials {
        self.clone().into()
    }
}
