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

//! An OAuth2 client for user-delegated access.
//!
//! The client implements the [authorization code flow]: it generates the
//! consent URL, exchanges the returned code for tokens, refreshes and
//! revokes them. It also verifies Google-signed ID tokens, using the
//! federated sign-on certificates.
//!
//! ## Example
//!
//! ```
//! # use google_cloud_adc::credentials::oauth2::{AuthUrlOptions, Builder};
//! let client = Builder::new("my-client-id")
//!     .with_client_secret("my-client-secret")
//!     .with_redirect_uri("https://example.com/oauth2callback")
//!     .build();
//! let url = client.generate_auth_url(
//!     &AuthUrlOptions::new()
//!         .with_scopes(["https://www.googleapis.com/auth/cloud-platform"])
//!         .with_param("access_type", "offline"),
//! )?;
//! assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?response_type=code"));
//! # Ok::<(), google_cloud_adc::errors::CredentialsError>(())
//! ```
//!
//! [authorization code flow]: https://developers.google.com/identity/protocols/oauth2/web-server

use crate::Result;
use crate::constants::{
    AUTHORIZATION_CODE_GRANT_TYPE, GOOGLE_ISSUERS, OAUTH2_AUTH_BASE_URI,
    OAUTH2_FEDERATED_SIGNON_CERTS_URI, OAUTH2_REVOKE_URI, OAUTH2_TOKEN_URI,
    REFRESH_TOKEN_GRANT_TYPE,
};
use crate::credentials::idtoken::LoginTicket;
use crate::credentials::idtoken::verifier::{Audience, Verifier};
use crate::credentials::internal::cert_cache::CertificateCache;
use crate::credentials::{Credentials, CredentialsKind, CredentialsProvider};
use crate::errors::CredentialsError;
use crate::token::{Token, TokenProvider, TokenResponse};
use crate::token_cache::TokenHolder;
use crate::transport::{self, ReqwestTransporter, Transporter};
use bytes::Bytes;
use http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Refreshes access tokens with the `refresh_token` grant.
///
/// Shared by the OAuth2 client and the user credentials.
pub(crate) struct RefreshTokenProvider {
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<String>,
    pub(crate) scopes: Option<Vec<String>>,
    pub(crate) token_uri: String,
    pub(crate) transporter: Arc<dyn Transporter>,
}

impl std::fmt::Debug for RefreshTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenProvider")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[censored]"))
            .field("scopes", &self.scopes)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TokenProvider for RefreshTokenProvider {
    async fn refresh(&self, current: &Token) -> Result<TokenResponse> {
        let Some(refresh_token) = current.refresh_token.as_deref() else {
            let message = if current.access_token.is_none() {
                "No access or refresh token is set."
            } else {
                "No refresh token is set."
            };
            return Err(CredentialsError::configuration_msg(message));
        };
        let scope = self.scopes.as_ref().map(|s| s.join(" "));
        let mut params = vec![
            ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        if let Some(scope) = scope.as_deref().filter(|s| !s.is_empty()) {
            params.push(("scope", scope));
        }
        let request = transport::form_post(&self.token_uri, &params)?;
        transport::send_json(
            self.transporter.as_ref(),
            request,
            "failed to refresh the access token",
        )
        .await
    }
}

/// The options for [OAuth2Client::generate_auth_url].
#[derive(Clone, Debug, Default)]
pub struct AuthUrlOptions {
    response_type: Option<String>,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    params: Vec<(String, String)>,
}

impl AuthUrlOptions {
    /// Creates options with the client defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `response_type`, the default is `code`.
    pub fn with_response_type<S: Into<String>>(mut self, v: S) -> Self {
        self.response_type = Some(v.into());
        self
    }

    /// Overrides the client id of the client.
    pub fn with_client_id<S: Into<String>>(mut self, v: S) -> Self {
        self.client_id = Some(v.into());
        self
    }

    /// Overrides the redirect URI of the client.
    pub fn with_redirect_uri<S: Into<String>>(mut self, v: S) -> Self {
        self.redirect_uri = Some(v.into());
        self
    }

    /// Sets the scopes to request, sent as a single space separated `scope`.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a query parameter, for example `access_type` or `state`.
    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// A builder for [OAuth2Client].
#[derive(Debug)]
pub struct Builder {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    credentials: Token,
    token_uri: String,
    auth_uri: String,
    revoke_uri: String,
    certs_url: String,
    transporter: Option<Arc<dyn Transporter>>,
}

impl Builder {
    /// Creates a builder for the OAuth2 client `client_id`.
    pub fn new<S: Into<String>>(client_id: S) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            credentials: Token::default(),
            token_uri: OAUTH2_TOKEN_URI.to_string(),
            auth_uri: OAUTH2_AUTH_BASE_URI.to_string(),
            revoke_uri: OAUTH2_REVOKE_URI.to_string(),
            certs_url: OAUTH2_FEDERATED_SIGNON_CERTS_URI.to_string(),
            transporter: None,
        }
    }

    /// Sets the client secret.
    pub fn with_client_secret<S: Into<String>>(mut self, v: S) -> Self {
        self.client_secret = Some(v.into());
        self
    }

    /// Sets the redirect URI registered for the client.
    pub fn with_redirect_uri<S: Into<String>>(mut self, v: S) -> Self {
        self.redirect_uri = Some(v.into());
        self
    }

    /// Sets the initial credentials, for example a stored refresh token.
    pub fn with_credentials(mut self, v: Token) -> Self {
        self.credentials = v;
        self
    }

    /// Overrides the token endpoint.
    pub fn with_token_uri<S: Into<String>>(mut self, v: S) -> Self {
        self.token_uri = v.into();
        self
    }

    /// Overrides the consent page URL.
    pub fn with_auth_uri<S: Into<String>>(mut self, v: S) -> Self {
        self.auth_uri = v.into();
        self
    }

    /// Overrides the token revocation endpoint.
    pub fn with_revoke_uri<S: Into<String>>(mut self, v: S) -> Self {
        self.revoke_uri = v.into();
        self
    }

    /// Overrides the endpoint of the federated sign-on certificates.
    pub fn with_certs_url<S: Into<String>>(mut self, v: S) -> Self {
        self.certs_url = v.into();
        self
    }

    /// Sets the transporter for all the HTTP requests of the client.
    pub fn with_transporter(mut self, transporter: Arc<dyn Transporter>) -> Self {
        self.transporter = Some(transporter);
        self
    }

    /// Returns the configured client.
    pub fn build(self) -> OAuth2Client {
        let transporter = self
            .transporter
            .unwrap_or_else(|| Arc::new(ReqwestTransporter::new()));
        let provider = RefreshTokenProvider {
            client_id: self.client_id,
            client_secret: self.client_secret,
            scopes: None,
            token_uri: self.token_uri,
            transporter: transporter.clone(),
        };
        OAuth2Client {
            inner: Arc::new(ClientInner {
                holder: TokenHolder::new(provider, self.credentials),
                redirect_uri: self.redirect_uri,
                auth_uri: self.auth_uri,
                revoke_uri: self.revoke_uri,
                certs: CertificateCache::new(self.certs_url, transporter),
            }),
        }
    }
}

/// An OAuth2 client.
///
/// Clones share the held credentials and the certificate cache. Convert
/// the client into [Credentials] to use it like any other credential.
#[derive(Clone, Debug)]
pub struct OAuth2Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    holder: TokenHolder<RefreshTokenProvider>,
    redirect_uri: Option<String>,
    auth_uri: String,
    revoke_uri: String,
    certs: CertificateCache,
}

impl OAuth2Client {
    fn provider(&self) -> &RefreshTokenProvider {
        self.inner.holder.provider()
    }

    /// Returns the URL of the consent page.
    pub fn generate_auth_url(&self, options: &AuthUrlOptions) -> Result<String> {
        let mut url = url::Url::parse(&self.inner.auth_uri).map_err(|e| {
            CredentialsError::configuration(e).with_context("invalid authorization URI")
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(
                "response_type",
                options.response_type.as_deref().unwrap_or("code"),
            );
            query.append_pair(
                "client_id",
                options
                    .client_id
                    .as_deref()
                    .unwrap_or(&self.provider().client_id),
            );
            if let Some(redirect_uri) = options
                .redirect_uri
                .as_deref()
                .or(self.inner.redirect_uri.as_deref())
            {
                query.append_pair("redirect_uri", redirect_uri);
            }
            if !options.scopes.is_empty() {
                query.append_pair("scope", &options.scopes.join(" "));
            }
            for (key, value) in &options.params {
                query.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// The held credentials are not modified, use
    /// [set_credentials][CredentialsProvider::set_credentials] to keep the
    /// returned tokens.
    pub async fn get_token(&self, code: &str) -> Result<Token> {
        let provider = self.provider();
        let mut params = vec![
            ("code", code),
            ("client_id", provider.client_id.as_str()),
            ("grant_type", AUTHORIZATION_CODE_GRANT_TYPE),
        ];
        if let Some(secret) = &provider.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        if let Some(redirect_uri) = &self.inner.redirect_uri {
            params.push(("redirect_uri", redirect_uri.as_str()));
        }
        let request = transport::form_post(&provider.token_uri, &params)?;
        let response: TokenResponse = transport::send_json(
            provider.transporter.as_ref(),
            request,
            "failed to exchange the authorization code",
        )
        .await?;
        Ok(response.into_token())
    }

    /// Refreshes the access token using the held refresh token.
    pub async fn refresh_access_token(&self) -> Result<Token> {
        self.inner.holder.refresh().await
    }

    /// Revokes an access or refresh token.
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        let mut url = url::Url::parse(&self.inner.revoke_uri).map_err(|e| {
            CredentialsError::configuration(e).with_context("invalid revocation URI")
        })?;
        url.query_pairs_mut().append_pair("token", token);
        let request = transport::build(transport::get(url.as_str()), Bytes::new())?;
        transport::send(
            self.provider().transporter.as_ref(),
            request,
            "failed to revoke the token",
        )
        .await?;
        Ok(())
    }

    /// Clears the held credentials, and revokes their access token.
    pub async fn revoke_credentials(&self) -> Result<()> {
        let previous = self.inner.holder.current();
        self.inner.holder.set(Token::default());
        match previous.access_token {
            Some(token) => self.revoke_token(&token).await,
            None => Err(CredentialsError::configuration_msg(
                "No access token to revoke.",
            )),
        }
    }

    /// Returns the federated sign-on certificates, a map from key id to PEM
    /// encoded X.509 certificate.
    ///
    /// The certificates are fetched once per client.
    pub async fn get_federated_signon_certs(&self) -> Result<Arc<HashMap<String, String>>> {
        self.inner.certs.get_certs().await
    }

    /// Verifies a Google-issued ID token.
    ///
    /// `max_expiry` overrides the maximum token lifetime of 24 hours.
    pub async fn verify_id_token<A: Into<Audience>>(
        &self,
        id_token: &str,
        audience: A,
        max_expiry: Option<Duration>,
    ) -> Result<LoginTicket> {
        let certs = self.get_federated_signon_certs().await?;
        let mut verifier = Verifier::new(audience).with_issuers(GOOGLE_ISSUERS);
        if let Some(max_expiry) = max_expiry {
            verifier = verifier.with_max_expiry(max_expiry);
        }
        verifier
            .verify(id_token, &certs)
            .map_err(CredentialsError::validation)
    }
}

impl CredentialsProvider for OAuth2Client {
    fn kind(&self) -> CredentialsKind {
        CredentialsKind::OAuth2
    }

    async fn access_token(&self) -> Result<String> {
        self.inner.holder.access_token().await
    }

    async fn headers(&self, _uri: Option<&str>) -> Result<HeaderMap> {
        self.inner.holder.headers().await
    }

    async fn refresh(&self) -> Result<Token> {
        self.inner.holder.refresh().await
    }

    fn credentials(&self) -> Token {
        self.inner.holder.current()
    }

    fn set_credentials(&self, token: Token) {
        self.inner.holder.set(token)
    }

    fn create_scoped_required(&self) -> bool {
        false
    }

    fn create_scoped(&self, _scopes: Vec<String>) -> Credentials {
        self.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::idtoken::verifier::ValidationError;
    use crate::credentials::idtoken::verifier::tests::{sign, valid_payload};
    use crate::token::now_millis;
    use google_cloud_adc_test_utils::keys::PRIMARY;
    use http::StatusCode;
    use http::header::AUTHORIZATION;
    use httptest::matchers::{all_of, contains, request, url_decoded};
    use httptest::responders::{json_encoded, status_code};
    use httptest::{Expectation, Server};
    use serde_json::json;

    const CLIENT_ID: &str = "test-client-id";
    const CLIENT_SECRET: &str = "test-client-secret";
    const REDIRECT_URI: &str = "https://example.com/oauth2callback";

    fn builder() -> Builder {
        Builder::new(CLIENT_ID)
            .with_client_secret(CLIENT_SECRET)
            .with_redirect_uri(REDIRECT_URI)
    }

    fn with_server(server: &Server) -> Builder {
        builder()
            .with_token_uri(server.url("/token").to_string())
            .with_revoke_uri(server.url("/revoke").to_string())
            .with_certs_url(server.url("/certs").to_string())
    }

    fn query(url: &str) -> Vec<(String, String)> {
        url::Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn auth_url() -> anyhow::Result<()> {
        let client = builder().build();
        let url = client.generate_auth_url(
            &AuthUrlOptions::new()
                .with_scopes(["scope1", "scope2"])
                .with_param("access_type", "offline"),
        )?;
        assert!(url.starts_with(OAUTH2_AUTH_BASE_URI), "{url}");
        let want = [
            ("response_type", "code"),
            ("client_id", CLIENT_ID),
            ("redirect_uri", REDIRECT_URI),
            ("scope", "scope1 scope2"),
            ("access_type", "offline"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        assert_eq!(query(&url), want);
        Ok(())
    }

    #[test]
    fn auth_url_overrides() -> anyhow::Result<()> {
        let client = builder().build();
        let url = client.generate_auth_url(
            &AuthUrlOptions::new()
                .with_response_type("token")
                .with_client_id("other-client-id")
                .with_redirect_uri("https://other.example.com/"),
        )?;
        let query = query(&url);
        assert!(query.contains(&("response_type".into(), "token".into())), "{query:?}");
        assert!(query.contains(&("client_id".into(), "other-client-id".into())), "{query:?}");
        assert!(
            query.contains(&("redirect_uri".into(), "https://other.example.com/".into())),
            "{query:?}"
        );
        assert!(!query.iter().any(|(k, _)| k == "scope"), "{query:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_token() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/token"),
                request::body(url_decoded(contains(("code", "test-code")))),
                request::body(url_decoded(contains(("grant_type", "authorization_code")))),
                request::body(url_decoded(contains(("client_secret", CLIENT_SECRET)))),
                request::body(url_decoded(contains(("redirect_uri", REDIRECT_URI)))),
            ])
            .respond_with(json_encoded(json!({
                "access_token": "abc",
                "refresh_token": "123",
                "expires_in": 10,
            }))),
        );
        let client = with_server(&server).build();
        let before = now_millis();
        let token = client.get_token("test-code").await?;
        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert_eq!(token.refresh_token.as_deref(), Some("123"));
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        let expiry = token.expiry_date.unwrap();
        assert!(expiry >= before + 10_000 && expiry <= now_millis() + 10_000, "{expiry}");
        // The held credentials are not modified.
        assert_eq!(client.credentials(), Token::default());
        Ok(())
    }

    #[tokio::test]
    async fn no_access_or_refresh_token() {
        let client = builder().build();
        let err = client.access_token().await.unwrap_err();
        assert!(err.is_configuration(), "{err:?}");
        assert_eq!(err.to_string(), "No access or refresh token is set.");
    }

    #[tokio::test]
    async fn expired_without_refresh_token() {
        let client = builder()
            .with_credentials(Token {
                access_token: Some("expired".into()),
                expiry_date: Some(now_millis() - 1000),
                ..Default::default()
            })
            .build();
        let err = client.access_token().await.unwrap_err();
        assert_eq!(err.to_string(), "No refresh token is set.");
        let err = client.refresh_access_token().await.unwrap_err();
        assert_eq!(err.to_string(), "No refresh token is set.");
    }

    #[tokio::test]
    async fn valid_token_is_used() -> anyhow::Result<()> {
        let client = builder()
            .with_credentials(Token::from_access_token("no-expiry"))
            .build();
        let headers = client.headers(None).await?;
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer no-expiry");
        Ok(())
    }

    #[tokio::test]
    async fn refresh_when_expired() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/token"),
                request::body(url_decoded(contains(("grant_type", "refresh_token")))),
                request::body(url_decoded(contains(("refresh_token", "refresh-token-placeholder")))),
                request::body(url_decoded(contains(("client_id", CLIENT_ID)))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({
                "access_token": "abc123",
                "expires_in": 3600,
                "token_type": "Bearer",
            }))),
        );
        let client = with_server(&server)
            .with_credentials(Token {
                access_token: Some("initial-access-token".into()),
                refresh_token: Some("refresh-token-placeholder".into()),
                expiry_date: Some(now_millis() - 1000),
                ..Default::default()
            })
            .build();
        assert_eq!(client.access_token().await?, "abc123");
        assert_eq!(client.access_token().await?, "abc123");
        let held = client.credentials();
        assert_eq!(held.refresh_token.as_deref(), Some("refresh-token-placeholder"));
        assert!(!held.is_expired());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_errors_are_not_retried() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/token"))
                .times(1)
                .respond_with(status_code(503)),
        );
        let client = with_server(&server)
            .with_credentials(Token {
                refresh_token: Some("refresh".into()),
                ..Default::default()
            })
            .build();
        let err = client.access_token().await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");
        assert_eq!(err.http_status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        Ok(())
    }

    #[tokio::test]
    async fn revoke_credentials() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/revoke"),
                request::query(url_decoded(contains(("token", "abc")))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({}))),
        );
        let client = with_server(&server)
            .with_credentials(Token {
                access_token: Some("abc".into()),
                refresh_token: Some("abc".into()),
                ..Default::default()
            })
            .build();
        client.revoke_credentials().await?;
        assert_eq!(client.credentials(), Token::default());
        Ok(())
    }

    #[tokio::test]
    async fn revoke_credentials_without_token() {
        let client = builder()
            .with_credentials(Token {
                refresh_token: Some("refresh".into()),
                ..Default::default()
            })
            .build();
        let err = client.revoke_credentials().await.unwrap_err();
        assert_eq!(err.to_string(), "No access token to revoke.");
        // The credentials are cleared anyway.
        assert_eq!(client.credentials(), Token::default());
    }

    #[tokio::test]
    async fn revoke_token_error() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/revoke")).respond_with(
                status_code(400).body(json!({"error": "invalid_token"}).to_string()),
            ),
        );
        let client = with_server(&server).build();
        let err = client.revoke_token("bad").await.unwrap_err();
        assert_eq!(err.http_status(), Some(StatusCode::BAD_REQUEST));
        assert!(err.to_string().contains("invalid_token"), "{err}");
        Ok(())
    }

    fn expect_certs(server: &Server, times: usize) {
        server.expect(
            Expectation::matching(request::method_path("GET", "/certs"))
                .times(times)
                .respond_with(json_encoded(json!({"test-key-id": PRIMARY.public_pem}))),
        );
    }

    #[tokio::test]
    async fn certs_are_cached() -> anyhow::Result<()> {
        let server = Server::run();
        expect_certs(&server, 1);
        let client = with_server(&server).build();
        let first = client.get_federated_signon_certs().await?;
        let second = client.clone().get_federated_signon_certs().await?;
        assert_eq!(first, second);
        assert!(first.contains_key("test-key-id"));
        Ok(())
    }

    #[tokio::test]
    async fn verify_id_token() -> anyhow::Result<()> {
        let server = Server::run();
        expect_certs(&server, 1);
        let client = with_server(&server).build();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let token = sign(&valid_payload(now));

        let ticket = client.verify_id_token(&token, CLIENT_ID, None).await?;
        assert_eq!(ticket.user_id(), Some("123456789"));

        let err = client
            .verify_id_token(&token, vec!["other-1", "other-2"], None)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{err:?}");
        assert!(
            matches!(
                err.validation_error(),
                Some(ValidationError::WrongRecipient { .. })
            ),
            "{err:?}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn verify_id_token_issuer_and_max_expiry() -> anyhow::Result<()> {
        let server = Server::run();
        expect_certs(&server, 1);
        let client = with_server(&server).build();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();

        let mut payload = valid_payload(now);
        payload["iss"] = json!("https://evil.example.com");
        let err = client
            .verify_id_token(&sign(&payload), CLIENT_ID, None)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.validation_error(),
                Some(ValidationError::InvalidIssuer { .. })
            ),
            "{err:?}"
        );

        let mut payload = valid_payload(now);
        payload["iss"] = json!("https://accounts.google.com");
        payload["exp"] = json!(now + 2 * 86400);
        let token = sign(&payload);
        let err = client
            .verify_id_token(&token, CLIENT_ID, None)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.validation_error(),
                Some(ValidationError::ExpiryTooFarInFuture { .. })
            ),
            "{err:?}"
        );
        client
            .verify_id_token(&token, CLIENT_ID, Some(Duration::from_secs(3 * 86400)))
            .await?;
        Ok(())
    }
}
