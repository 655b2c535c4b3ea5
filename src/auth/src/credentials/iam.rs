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

//! IAM credentials.
//!
//! These credentials hold a fixed authority selector and authorization
//! token, issued by IAM for a specific principal. They are sent as two
//! headers, and are never refreshed.

use crate::Result;
use crate::credentials::{Credentials, CredentialsKind, CredentialsProvider};
use crate::headers_util::build_iam_headers;
use crate::token::Token;
use http::HeaderMap;
use std::sync::Arc;

/// Creates IAM [Credentials].
///
/// ```
/// # use google_cloud_adc::credentials::iam;
/// let credentials = iam::new("test-selector", "test-token");
/// assert!(!credentials.create_scoped_required());
/// ```
pub fn new<S: Into<String>, T: Into<String>>(selector: S, token: T) -> Credentials {
    IamCredentials {
        inner: Arc::new(Inner {
            selector: selector.into(),
            token: token.into(),
        }),
    }
    .into()
}

#[derive(Clone, Debug)]
struct IamCredentials {
    inner: Arc<Inner>,
}

struct Inner {
    selector: String,
    token: String,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamCredentials")
            .field("selector", &self.selector)
            .field("token", &"[censored]")
            .finish()
    }
}

impl CredentialsProvider for IamCredentials {
    fn kind(&self) -> CredentialsKind {
        CredentialsKind::Iam
    }

    async fn access_token(&self) -> Result<String> {
        Ok(self.inner.token.clone())
    }

    async fn headers(&self, _uri: Option<&str>) -> Result<HeaderMap> {
        build_iam_headers(&self.inner.selector, &self.inner.token)
    }

    async fn refresh(&self) -> Result<Token> {
        Ok(self.credentials())
    }

    fn credentials(&self) -> Token {
        Token::from_access_token(self.inner.token.clone())
    }

    fn set_credentials(&self, _token: Token) {}

    fn create_scoped_required(&self) -> bool {
        false
    }

    fn create_scoped(&self, _scopes: Vec<String>) -> Credentials {
        self.clone().into()
    }
}
