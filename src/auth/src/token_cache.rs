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

use crate::Result;
use crate::errors::CredentialsError;
use crate::headers_util::build_bearer_headers;
use crate::token::{Token, TokenProvider};
use http::HeaderMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds the credentials of one variant and refreshes them on demand.
///
/// There is no background refresh. A refresh happens when a caller asks for
/// a token and the held access token is missing or expired. Concurrent
/// callers wait for a single in-flight refresh instead of starting their own.
#[derive(Debug)]
pub(crate) struct TokenHolder<T>
where
    T: TokenProvider,
{
    state: Mutex<Token>,

    // Held for the duration of a refresh.
    refresh_lock: tokio::sync::Mutex<()>,

    // The token provider. This thing does the refreshing.
    provider: T,
}

impl<T: TokenProvider> TokenHolder<T> {
    pub(crate) fn new(provider: T, initial: Token) -> Self {
        Self {
            state: Mutex::new(initial),
            refresh_lock: tokio::sync::Mutex::new(()),
            provider,
        }
    }

    pub(crate) fn provider(&self) -> &T {
        &self.provider
    }

    fn lock(&self) -> MutexGuard<'_, Token> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the held credentials.
    pub(crate) fn current(&self) -> Token {
        self.lock().clone()
    }

    /// Replaces the held credentials.
    pub(crate) fn set(&self, token: Token) {
        *self.lock() = token;
    }

    fn fresh(&self) -> Option<Token> {
        let token = self.current();
        (!token.needs_refresh()).then_some(token)
    }

    /// Returns credentials with a valid access token, refreshing them first
    /// if needed.
    pub(crate) async fn ensure_fresh(&self) -> Result<Token> {
        if let Some(token) = self.fresh() {
            return Ok(token);
        }
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have completed a refresh while we waited.
        if let Some(token) = self.fresh() {
            return Ok(token);
        }
        self.refresh_locked().await
    }

    /// Returns a valid access token, refreshing the credentials if needed.
    pub(crate) async fn access_token(&self) -> Result<String> {
        self.ensure_fresh()
            .await?
            .access_token
            .ok_or_else(|| CredentialsError::from_msg(false, "no access token is available"))
    }

    /// Returns the `Authorization` header for a valid access token.
    pub(crate) async fn headers(&self) -> Result<HeaderMap> {
        build_bearer_headers(&self.ensure_fresh().await?)
    }

    /// Refreshes the credentials, even if the access token is still valid.
    pub(crate) async fn refresh(&self) -> Result<Token> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Token> {
        let current = self.current();
        tracing::debug!(provider = ?self.provider, "refreshing access token");
        let response = self.provider.refresh(&current).await?;
        let updated = current.merge(response);
        self.set(updated.clone());
        Ok(updated)
    }
}
