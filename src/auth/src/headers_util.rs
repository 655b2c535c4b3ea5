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
use crate::constants::{IAM_AUTHORITY_SELECTOR_HEADER, IAM_AUTHORIZATION_TOKEN_HEADER};
use crate::errors::CredentialsError;
use crate::token::Token;
use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// Creates the `Authorization: <type> <token>` header for a token.
pub(crate) fn build_bearer_headers(token: &Token) -> Result<HeaderMap> {
    let access_token = token
        .access_token
        .as_deref()
        .ok_or_else(|| CredentialsError::from_msg(false, "no access token is available"))?;
    let value = sensitive_value(&format!("{} {access_token}", token.token_type()))?;
    Ok(HeaderMap::from_iter([(AUTHORIZATION, value)]))
}

/// Creates the authority selector and authorization token headers used by
/// IAM credentials.
pub(crate) fn build_iam_headers(selector: &str, token: &str) -> Result<HeaderMap> {
    let selector = HeaderValue::from_str(selector).map_err(|e| {
        CredentialsError::configuration(e).with_context("invalid IAM authority selector")
    })?;
    Ok(HeaderMap::from_iter([
        (
            HeaderName::from_static(IAM_AUTHORITY_SELECTOR_HEADER),
            selector,
        ),
        (
            HeaderName::from_static(IAM_AUTHORIZATION_TOKEN_HEADER),
            sensitive_value(token)?,
        ),
    ]))
}

fn sensitive_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|e| CredentialsError::from_source(false, e))?;
    value.set_sensitive(true);
    Ok(value)
}
