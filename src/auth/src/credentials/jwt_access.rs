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

//! Self-signed JWT credentials.
//!
//! These credentials use the service account key to sign a JWT whose
//! audience is the service receiving the request. The signed JWT is sent
//! directly as the bearer token, no token endpoint is involved.
//!
//! The audience is derived from the URI of each request, so these
//! credentials can only produce headers when the caller provides that URI.

use crate::Result;
use crate::constants::JWT_LIFETIME_SECS;
use crate::credentials::jws::{self, JwsClaims};
use crate::credentials::service_account::ServiceAccountKey;
use crate::credentials::{Credentials, CredentialsKind, CredentialsProvider};
use crate::errors::CredentialsError;
use crate::headers_util::build_bearer_headers;
use crate::token::Token;
use http::HeaderMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

// Cached tokens are reused until they are this close to expiring.
const REUSE_MARGIN_SECS: i64 = 300;

/// Signs a JWT for `audience`, valid for one hour.
pub(crate) fn self_signed_jwt(
    email: &str,
    private_key: &str,
    key_id: Option<&str>,
    audience: &str,
) -> Result<String> {
    let mut claims = JwsClaims::new(email, audience);
    claims.sub = Some(email);
    jws::sign_jwt(private_key, key_id, &claims)
}

/// Self-signed JWTs, keyed by audience.
///
/// Expired entries are dropped whenever a new JWT is stored.
#[derive(Debug, Default)]
pub(crate) struct JwtCache {
    // audience -> (jwt, expiration in seconds since the epoch)
    entries: Mutex<HashMap<String, (String, i64)>>,
}

impl JwtCache {
    /// Returns the cached JWT for `audience`, or stores the one created by
    /// `sign`.
    pub(crate) fn get_or_sign<F>(&self, audience: &str, sign: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((jwt, exp)) = entries.get(audience) {
            if exp - now > REUSE_MARGIN_SECS {
                return Ok(jwt.clone());
            }
        }
        let jwt = sign()?;
        entries.retain(|_, (_, exp)| *exp > now);
        entries.insert(audience.to_string(), (jwt.clone(), now + JWT_LIFETIME_SECS));
        Ok(jwt)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[cfg(test)]
    pub(crate) fn insert_expiring_at(&self, audience: &str, exp: i64) {
        self.entries
            .lock()
            .unwrap()
            .insert(audience.to_string(), ("stale-jwt".to_string(), exp));
    }
}

/// A builder for self-signed JWT [Credentials].
#[derive(Debug)]
pub struct Builder {
    email: String,
    key: String,
    key_id: Option<String>,
}

impl Builder {
    /// Creates a builder for the service account `email` with its PEM
    /// encoded private `key`.
    pub fn new<E: Into<String>, K: Into<String>>(email: E, key: K) -> Self {
        Self {
            email: email.into(),
            key: key.into(),
            key_id: None,
        }
    }

    /// Creates a builder from a service account key.
    pub fn from_key(key: ServiceAccountKey) -> Self {
        Self {
            email: key.client_email,
            key: key.private_key,
            key_id: Some(key.private_key_id).filter(|k| !k.is_empty()),
        }
    }

    /// Sets the id of the private key, sent as the `kid` of the JWT header.
    pub fn with_key_id<S: Into<String>>(mut self, key_id: S) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Returns the configured [Credentials].
    pub fn build(self) -> Result<Credentials> {
        ServiceAccountKey {
            client_email: self.email.clone(),
            private_key: self.key.clone(),
            ..Default::default()
        }
        .validate()?;
        Ok(JwtAccessCredentials {
            inner: Arc::new(Inner {
                email: self.email,
                key: self.key,
                key_id: self.key_id,
                cache: JwtCache::default(),
            }),
        }
        .into())
    }
}

#[derive(Clone, Debug)]
struct JwtAccessCredentials {
    inner: Arc<Inner>,
}

struct Inner {
    email: String,
    key: String,
    key_id: Option<String>,
    cache: JwtCache,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAccessCredentials")
            .field("email", &self.email)
            .field("key", &"[censored]")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn token_for(&self, audience: &str) -> Result<String> {
        self.cache.get_or_sign(audience, || {
            self_signed_jwt(&self.email, &self.key, self.key_id.as_deref(), audience)
        })
    }
}

fn requires_uri() -> CredentialsError {
    CredentialsError::configuration_msg(
        "self-signed JWT credentials need the request URI to create the authorization headers",
    )
}

impl CredentialsProvider for JwtAccessCredentials {
    fn kind(&self) -> CredentialsKind {
        CredentialsKind::JwtAccess
    }

    async fn access_token(&self) -> Result<String> {
        Err(requires_uri())
    }

    async fn headers(&self, uri: Option<&str>) -> Result<HeaderMap> {
        let uri = uri.ok_or_else(requires_uri)?;
        build_bearer_headers(&Token::from_access_token(self.inner.token_for(uri)?))
    }

    async fn refresh(&self) -> Result<Token> {
        Err(requires_uri())
    }

    fn credentials(&self) -> Token {
        Token::default()
    }

    fn set_credentials(&self, _token: Token) {}

    fn create_scoped_required(&self) -> bool {
        false
    }

    fn create_scoped(&self, _scopes: Vec<String>) -> Credentials {
        self.clone().into()
    }
}
