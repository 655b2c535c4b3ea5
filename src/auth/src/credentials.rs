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

//! Credentials: the objects that produce authentication headers for Google
//! Cloud requests.
//!
//! Every credential type in this crate is wrapped in a [Credentials] handle.
//! The handle is cheap to clone, and all clones share the same underlying
//! state: refreshing the token through one clone makes it available to all
//! of them.
//!
//! Most applications obtain their credentials from the
//! [Resolver](crate::resolver::Resolver). Use the builders in the submodules
//! to create a specific credential type.

pub mod iam;
pub mod idtoken;
pub(crate) mod internal;
pub(crate) mod jws;
pub mod jwt_access;
pub mod mds;
pub mod oauth2;
pub mod service_account;
pub mod user_account;

use crate::Result;
use crate::build_errors::Error as BuildError;
use crate::errors::{self, CredentialsError};
use crate::token::Token;
use crate::transport::{self, HttpRequest, HttpResponse, Transporter};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The kind of credentials held by a [Credentials] handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialsKind {
    /// Service account credentials, exchanging signed assertions for access
    /// tokens.
    ServiceAccount,
    /// Service account credentials used to sign bearer tokens locally.
    JwtAccess,
    /// User credentials created with a stored refresh token.
    UserRefresh,
    /// An OAuth2 client, for user-delegated access.
    OAuth2,
    /// The default service account of a Compute Engine instance.
    ComputeEngine,
    /// Static IAM authority selector and authorization token.
    Iam,
}

/// A handle to a credential.
///
/// The handle refreshes the underlying access token when it is missing or
/// expired. There is no background refresh, and failed refreshes are not
/// retried.
#[derive(Clone, Debug)]
pub struct Credentials {
    inner: Arc<dyn dynamic::CredentialsProvider>,
}

impl<T> std::convert::From<T> for Credentials
where
    T: CredentialsProvider + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl Credentials {
    /// Returns `true` if both handles refer to the same credential instance.
    pub fn ptr_eq(a: &Credentials, b: &Credentials) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// The kind of credentials.
    pub fn kind(&self) -> CredentialsKind {
        self.inner.kind()
    }

    /// Returns a valid access token, refreshing it if needed.
    pub async fn access_token(&self) -> Result<String> {
        self.inner.access_token().await
    }

    /// Returns the headers to authenticate a request to `uri`.
    ///
    /// For most credentials this is a single `Authorization: Bearer <token>`
    /// header. IAM credentials return their authority selector and
    /// authorization token headers instead.
    pub async fn headers(&self, uri: Option<&str>) -> Result<HeaderMap> {
        self.inner.headers(uri).await
    }

    /// Refreshes the access token, even if it has not expired.
    pub async fn refresh(&self) -> Result<Token> {
        self.inner.refresh().await
    }

    /// A copy of the currently held credentials.
    pub fn credentials(&self) -> Token {
        self.inner.credentials()
    }

    /// Replaces the currently held credentials.
    pub fn set_credentials(&self, token: Token) {
        self.inner.set_credentials(token)
    }

    /// Returns `true` if these credentials need scopes before they can
    /// produce access tokens.
    pub fn create_scoped_required(&self) -> bool {
        self.inner.create_scoped_required()
    }

    /// Returns new credentials, with the same identity and different
    /// scopes. The original credentials are not modified.
    pub fn create_scoped<I, S>(&self, scopes: I) -> Credentials
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .create_scoped(scopes.into_iter().map(Into::into).collect())
    }

    /// Sends an authenticated request.
    ///
    /// If the response is `401 Unauthorized` or `403 Forbidden`, and the
    /// credentials hold a refresh token, the token is refreshed and the
    /// request is sent once more. A non-success final response is returned
    /// as an error.
    pub async fn request(
        &self,
        transporter: &dyn Transporter,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let (parts, body) = request.into_parts();
        let mut response = self.send_authorized(transporter, &parts, &body).await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) && self.credentials().refresh_token.is_some()
        {
            tracing::debug!(status = %response.status(), uri = %parts.uri, "refreshing credentials and retrying request");
            self.refresh().await?;
            response = self.send_authorized(transporter, &parts, &body).await?;
        }
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(self.inner.api_error(status).unwrap_or_else(|| {
            errors::from_http_response(status, response.body(), "the request failed")
        }))
    }

    async fn send_authorized(
        &self,
        transporter: &dyn Transporter,
        parts: &http::request::Parts,
        body: &Bytes,
    ) -> Result<HttpResponse> {
        let uri = parts.uri.to_string();
        let auth_headers = self.headers(Some(&uri)).await?;
        let builder = http::Request::builder()
            .method(parts.method.clone())
            .uri(parts.uri.clone())
            .version(parts.version);
        let mut request = transport::build(builder, body.clone())?;
        *request.headers_mut() = parts.headers.clone();
        request.headers_mut().extend(auth_headers);
        transporter.execute(request).await
    }
}

/// The behavior shared by every credential type.
///
/// Implement this trait to create custom credentials, for example to use an
/// authentication system not supported by this crate, or to mock
/// credentials in tests. Wrap the implementation in a [Credentials] handle
/// with `Credentials::from()`.
pub trait CredentialsProvider: std::fmt::Debug {
    /// The kind of credentials.
    fn kind(&self) -> CredentialsKind;

    /// Returns a valid access token, refreshing it if needed.
    fn access_token(&self) -> impl Future<Output = Result<String>> + Send;

    /// Returns the headers to authenticate a request to `uri`.
    fn headers(&self, uri: Option<&str>) -> impl Future<Output = Result<HeaderMap>> + Send;

    /// Refreshes the access token, even if it has not expired.
    fn refresh(&self) -> impl Future<Output = Result<Token>> + Send;

    /// A copy of the currently held credentials.
    fn credentials(&self) -> Token;

    /// Replaces the currently held credentials.
    fn set_credentials(&self, token: Token);

    /// Returns `true` if the credentials need scopes to mint tokens.
    fn create_scoped_required(&self) -> bool;

    /// Returns new credentials with the same identity and `scopes`.
    fn create_scoped(&self, scopes: Vec<String>) -> Credentials;

    /// Translates the final status of a failed API request into an error.
    ///
    /// Returning `None` uses the generic error built from the response.
    fn api_error(&self, _status: StatusCode) -> Option<CredentialsError> {
        None
    }
}

pub(crate) mod dynamic {
    use super::{Credentials, CredentialsKind};
    use crate::Result;
    use crate::errors::CredentialsError;
    use crate::token::Token;
    use http::{HeaderMap, StatusCode};

    /// A dyn-compatible, crate-private version of `CredentialsProvider`.
    #[async_trait::async_trait]
    pub trait CredentialsProvider: Send + Sync + std::fmt::Debug {
        fn kind(&self) -> CredentialsKind;
        async fn access_token(&self) -> Result<String>;
        async fn headers(&self, uri: Option<&str>) -> Result<HeaderMap>;
        async fn refresh(&self) -> Result<Token>;
        fn credentials(&self) -> Token;
        fn set_credentials(&self, token: Token);
        fn create_scoped_required(&self) -> bool;
        fn create_scoped(&self, scopes: Vec<String>) -> Credentials;
        fn api_error(&self, status: StatusCode) -> Option<CredentialsError>;
    }

    /// The public `CredentialsProvider` implements the dyn-compatible `CredentialsProvider`.
    #[async_trait::async_trait]
    impl<T> CredentialsProvider for T
    where
        T: super::CredentialsProvider + Send + Sync,
    {
        fn kind(&self) -> CredentialsKind {
            <T as super::CredentialsProvider>::kind(self)
        }
        async fn access_token(&self) -> Result<String> {
            <T as super::CredentialsProvider>::access_token(self).await
        }
        async fn headers(&self, uri: Option<&str>) -> Result<HeaderMap> {
            <T as super::CredentialsProvider>::headers(self, uri).await
        }
        async fn refresh(&self) -> Result<Token> {
            <T as super::CredentialsProvider>::refresh(self).await
        }
        fn credentials(&self) -> Token {
            <T as super::CredentialsProvider>::credentials(self)
        }
        fn set_credentials(&self, token: Token) {
            <T as super::CredentialsProvider>::set_credentials(self, token)
        }
        fn create_scoped_required(&self) -> bool {
            <T as super::CredentialsProvider>::create_scoped_required(self)
        }
        fn create_scoped(&self, scopes: Vec<String>) -> Credentials {
            <T as super::CredentialsProvider>::create_scoped(self, scopes)
        }
        fn api_error(&self, status: StatusCode) -> Option<CredentialsError> {
            <T as super::CredentialsProvider>::api_error(self, status)
        }
    }
}

/// The credential files this crate understands, selected by their `type`
/// field.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
pub(crate) enum CredentialsFile {
    #[serde(rename = "service_account")]
    ServiceAccount(service_account::ServiceAccountKey),
    #[serde(rename = "authorized_user")]
    AuthorizedUser(user_account::AuthorizedUser),
    #[serde(other)]
    Unsupported,
}

impl CredentialsFile {
    pub(crate) fn from_value(json: Value) -> std::result::Result<Self, BuildError> {
        if !json.is_object() {
            return Err(BuildError::parsing(
                "expected a JSON object containing the Google auth settings",
            ));
        }
        let tag = match json.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            Some(other) => return Err(BuildError::unknown_type(other.to_string())),
            None => return Err(BuildError::unknown_type("")),
        };
        match serde_json::from_value::<CredentialsFile>(json).map_err(BuildError::parsing)? {
            CredentialsFile::Unsupported => Err(BuildError::unknown_type(tag)),
            file => Ok(file),
        }
    }

    fn into_credentials(self, transporter: Arc<dyn Transporter>) -> Result<Credentials> {
        match self {
            CredentialsFile::ServiceAccount(key) => service_account::Builder::from_key(key)
                .with_transporter(transporter)
                .build(),
            CredentialsFile::AuthorizedUser(user) => user_account::Builder::from_authorized_user(user)
                .with_transporter(transporter)
                .build(),
            CredentialsFile::Unsupported => Err(BuildError::unknown_type("").into()),
        }
    }
}

/// Creates credentials from the contents of a credential file.
///
/// The `type` field selects the credential type: `service_account` creates
/// [service account](service_account) credentials, `authorized_user`
/// creates [user](user_account) credentials.
///
/// # Example
/// ```
/// # use google_cloud_adc::credentials::{self, CredentialsKind};
/// # use google_cloud_adc::transport::ReqwestTransporter;
/// # use std::sync::Arc;
/// let json = serde_json::json!({
///     "type": "authorized_user",
///     "client_id": "test-client-id",
///     "client_secret": "test-client-secret",
///     "refresh_token": "test-refresh-token",
/// });
/// let credentials = credentials::from_json(json, Arc::new(ReqwestTransporter::new()))?;
/// assert_eq!(credentials.kind(), CredentialsKind::UserRefresh);
/// # Ok::<(), google_cloud_adc::errors::CredentialsError>(())
/// ```
pub fn from_json(json: Value, transporter: Arc<dyn Transporter>) -> Result<Credentials> {
    CredentialsFile::from_value(json)?.into_credentials(transporter)
}

/// Creates credentials from a stream with the contents of a credential file.
///
/// See [from_json] for the supported credential types.
pub async fn from_stream<R>(reader: R, transporter: Arc<dyn Transporter>) -> Result<Credentials>
where
    R: AsyncRead + Unpin,
{
    from_json(read_json(reader).await?, transporter)
}

pub(crate) async fn read_json<R>(mut reader: R) -> std::result::Result<Value, BuildError>
where
    R: AsyncRead + Unpin,
{
    let mut contents = Vec::new();
    reader
        .read_to_end(&mut contents)
        .await
        .map_err(BuildError::loading)?;
    serde_json::from_slice(&contents).map_err(BuildError::parsing)
}
