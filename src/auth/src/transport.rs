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

//! The HTTP transport used by credentials.
//!
//! Credentials call token endpoints, the metadata server, and certificate
//! endpoints through a [Transporter]. The default implementation,
//! [ReqwestTransporter], uses [reqwest]. Applications and tests can supply
//! their own implementation to every builder in this crate.

use crate::Result;
use crate::constants::USER_AGENT as DEFAULT_USER_AGENT;
use crate::errors::{self, CredentialsError};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use http::Method;
use serde::de::DeserializeOwned;

/// An HTTP request with a buffered body.
pub type HttpRequest = http::Request<Bytes>;

/// An HTTP response with a buffered body.
pub type HttpResponse = http::Response<Bytes>;

/// Performs HTTP requests on behalf of credentials.
///
/// Implementations return the response for any status code. Only failures to
/// obtain a response are errors.
#[async_trait::async_trait]
pub trait Transporter: std::fmt::Debug + Send + Sync {
    /// Sends `request` and returns the full response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// A [Transporter] backed by a [reqwest::Client].
///
/// Appends the library user agent to the `User-Agent` header of each
/// request, unless already present.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransporter {
    client: reqwest::Client,
}

impl ReqwestTransporter {
    /// Creates a transporter with a default [reqwest::Client].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transporter using a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transporter for ReqwestTransporter {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let (mut parts, body) = request.into_parts();
        let user_agent = normalize_user_agent(parts.headers.get(USER_AGENT));
        parts.headers.insert(USER_AGENT, user_agent);

        let url = parts.uri.to_string();
        let response = self
            .client
            .request(parts.method, &url)
            .headers(parts.headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                // Requests that never got a response may succeed on a new attempt.
                CredentialsError::transport(
                    !e.is_builder(),
                    format!("cannot send request to {url}"),
                    e,
                )
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            CredentialsError::transport(true, format!("cannot read response from {url}"), e)
        })?;

        let mut output = http::Response::new(body);
        *output.status_mut() = status;
        *output.headers_mut() = headers;
        Ok(output)
    }
}

/// Appends the library user agent to `current`, at most once.
pub(crate) fn normalize_user_agent(current: Option<&HeaderValue>) -> HeaderValue {
    let current = current
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    match current {
        None => HeaderValue::from_static(DEFAULT_USER_AGENT),
        Some(v) if v.contains(DEFAULT_USER_AGENT) => {
            HeaderValue::from_str(v).unwrap_or(HeaderValue::from_static(DEFAULT_USER_AGENT))
        }
        Some(v) => HeaderValue::from_str(&format!("{v} {DEFAULT_USER_AGENT}"))
            .unwrap_or(HeaderValue::from_static(DEFAULT_USER_AGENT)),
    }
}

/// Finishes a request builder, mapping malformed URIs to configuration
/// errors.
pub(crate) fn build(builder: http::request::Builder, body: Bytes) -> Result<HttpRequest> {
    builder
        .body(body)
        .map_err(|e| CredentialsError::configuration(e).with_context("invalid request"))
}

/// A `GET` request without a body.
pub(crate) fn get(uri: &str) -> http::request::Builder {
    http::Request::builder().method(Method::GET).uri(uri)
}

/// A `POST` request with a form encoded body.
pub(crate) fn form_post(uri: &str, params: &[(&str, &str)]) -> Result<HttpRequest> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    build(
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
        Bytes::from(body),
    )
}

/// Sends `request` and decodes a successful JSON response.
///
/// Non-success statuses become errors carrying the status and the messages
/// found in the body. `context` describes the operation, and prefixes every
/// error message.
pub(crate) async fn send_json<T: DeserializeOwned>(
    transporter: &dyn Transporter,
    request: HttpRequest,
    context: &str,
) -> Result<T> {
    let response = send(transporter, request, context).await?;
    serde_json::from_slice::<T>(response.body()).map_err(|e| {
        // Decoding errors are not transient. Typically they indicate a badly
        // configured endpoint.
        CredentialsError::transport(false, format!("{context}: cannot decode the response"), e)
    })
}

/// Sends `request`, turning non-success statuses into errors.
pub(crate) async fn send(
    transporter: &dyn Transporter,
    request: HttpRequest,
    context: &str,
) -> Result<HttpResponse> {
    let response = transporter
        .execute(request)
        .await
        .map_err(|e| e.with_context(context.to_string()))?;
    if !response.status().is_success() {
        return Err(errors::from_http_response(
            response.status(),
            response.body(),
            context,
        ));
    }
    Ok(response)
}

/// A response with the given status and JSON body. Used by tests and by
/// [Transporter] mocks.
#[cfg(test)]
pub(crate) fn json_response(status: http::StatusCode, body: serde_json::Value) -> HttpResponse {
    let mut response = http::Response::new(Bytes::from(body.to_string()));
    *response.status_mut() = status;
    response
}
