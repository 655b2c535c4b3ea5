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

//! [Metadata Service] credentials.
//!
//! Google Cloud environments such as [Google Compute Engine (GCE)][gce-link],
//! [Google Kubernetes Engine (GKE)][gke-link], or [Cloud Run] provide a
//! metadata service. This is a local service to the VM (or pod) which
//! provides metadata information about the VM. The service also provides
//! access tokens associated with the [default service account] for the
//! corresponding VM.
//!
//! ## Example
//!
//! ```
//! # use google_cloud_adc::credentials::mds::Builder;
//! # use google_cloud_adc::credentials::CredentialsKind;
//! let credentials = Builder::default()
//!     .with_scopes(["https://www.googleapis.com/auth/cloud-platform"])
//!     .build();
//! assert_eq!(credentials.kind(), CredentialsKind::ComputeEngine);
//! ```
//!
//! [Cloud Run]: https://cloud.google.com/run
//! [default service account]: https://cloud.google.com/iam/docs/service-account-types#default
//! [gce-link]: https://cloud.google.com/products/compute
//! [gke-link]: https://cloud.google.com/kubernetes-engine
//! [Metadata Service]: https://cloud.google.com/compute/docs/metadata/overview

use crate::Result;
use crate::constants::{
    COMPUTE_PLACEHOLDER_REFRESH_TOKEN, MDS_PROJECT_ID_PATH, MDS_TOKEN_PATH, METADATA_FLAVOR,
    METADATA_FLAVOR_VALUE, METADATA_ROOT,
};
use crate::credentials::{Credentials, CredentialsKind, CredentialsProvider};
use crate::errors::{self, CredentialsError};
use crate::token::{Token, TokenProvider, TokenResponse};
use crate::token_cache::TokenHolder;
use crate::transport::{self, HttpRequest, ReqwestTransporter, Transporter};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;

const FORBIDDEN_MESSAGE: &str = "A Forbidden error was returned while attempting to retrieve an \
    access token for the Compute Engine built-in service account. This may be because the \
    Compute Engine instance does not have the correct permission scopes specified.";
const NOT_FOUND_MESSAGE: &str = "A Not Found error was returned while attempting to retrieve an \
    access token for the Compute Engine built-in service account. This may be because the \
    Compute Engine instance does not have any permission scopes specified.";
const REFRESH_SUFFIX: &str = "Could not refresh access token.";
const TOKEN_CONTEXT: &str = "failed to retrieve an access token from the metadata service";

fn permission_message(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::FORBIDDEN => Some(FORBIDDEN_MESSAGE),
        StatusCode::NOT_FOUND => Some(NOT_FOUND_MESSAGE),
        _ => None,
    }
}

fn metadata_request(endpoint: &str, path: &str) -> Result<HttpRequest> {
    transport::build(
        transport::get(&format!("{endpoint}{path}"))
            .header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE),
        Bytes::new(),
    )
}

/// Creates [Credentials] backed by the [Metadata Service].
///
/// [Metadata Service]: https://cloud.google.com/compute/docs/metadata/overview
#[derive(Debug, Default)]
pub struct Builder {
    endpoint: Option<String>,
    scopes: Option<Vec<String>>,
    transporter: Option<Arc<dyn Transporter>>,
}

impl Builder {
    /// Sets the endpoint of the metadata service.
    ///
    /// If not set, the credentials use `http://metadata.google.internal`.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Requests access tokens with these [scopes].
    ///
    /// If no scopes are specified, the tokens have all the scopes
    /// configured for the default service account of the instance.
    ///
    /// [scopes]: https://developers.google.com/identity/protocols/oauth2/scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the transporter used to call the metadata service.
    pub fn with_transporter(mut self, transporter: Arc<dyn Transporter>) -> Self {
        self.transporter = Some(transporter);
        self
    }

    /// Returns a [Credentials] instance with the configured settings.
    pub fn build(self) -> Credentials {
        let endpoint = self
            .endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| METADATA_ROOT.to_string());
        let provider = MdsTokenProvider {
            endpoint,
            scopes: self.scopes.filter(|s| !s.is_empty()),
            transporter: self
                .transporter
                .unwrap_or_else(|| Arc::new(ReqwestTransporter::new())),
        };
        let initial = Token {
            refresh_token: Some(COMPUTE_PLACEHOLDER_REFRESH_TOKEN.to_string()),
            ..Default::default()
        };
        MdsCredentials {
            holder: Arc::new(TokenHolder::new(provider, initial)),
        }
        .into()
    }
}

#[derive(Debug)]
struct MdsTokenProvider {
    endpoint: String,
    scopes: Option<Vec<String>>,
    transporter: Arc<dyn Transporter>,
}

impl MdsTokenProvider {
    fn token_path(&self) -> String {
        match &self.scopes {
            None => MDS_TOKEN_PATH.to_string(),
            Some(scopes) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("scopes", &scopes.join(","))
                    .finish();
                format!("{MDS_TOKEN_PATH}?{query}")
            }
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for MdsTokenProvider {
    async fn refresh(&self, _current: &Token) -> Result<TokenResponse> {
        let request = metadata_request(&self.endpoint, &self.token_path())?;
        let response = self
            .transporter
            .execute(request)
            .await
            .map_err(|e| e.with_context(TOKEN_CONTEXT))?;
        let status = response.status();
        if let Some(message) = permission_message(status) {
            return Err(CredentialsError::from_status(
                status,
                format!("{message} {REFRESH_SUFFIX}"),
            ));
        }
        if !status.is_success() {
            return Err(errors::from_http_response(
                status,
                response.body(),
                TOKEN_CONTEXT,
            ));
        }
        serde_json::from_slice::<TokenResponse>(response.body()).map_err(|e| {
            CredentialsError::transport(false, "cannot decode the metadata service token", e)
        })
    }
}

#[derive(Clone, Debug)]
struct MdsCredentials {
    holder: Arc<TokenHolder<MdsTokenProvider>>,
}

impl CredentialsProvider for MdsCredentials {
    fn kind(&self) -> CredentialsKind {
        CredentialsKind::ComputeEngine
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

    fn api_error(&self, status: StatusCode) -> Option<CredentialsError> {
        permission_message(status).map(|m| CredentialsError::from_status(status, m))
    }
}

/// Returns `true` if the metadata service at `endpoint` responds as the
/// Google metadata service. Any error means "not on Compute Engine".
pub(crate) async fn is_running_on_compute(transporter: &dyn Transporter, endpoint: &str) -> bool {
    let Ok(request) = metadata_request(endpoint, "") else {
        return false;
    };
    match transporter.execute(request).await {
        Ok(response) => response
            .headers()
            .get(METADATA_FLAVOR)
            .is_some_and(|v| v == METADATA_FLAVOR_VALUE),
        Err(e) => {
            tracing::debug!("metadata service probe failed: {e}");
            false
        }
    }
}

/// Returns the project id from the metadata service at `endpoint`.
pub(crate) async fn project_id(transporter: &dyn Transporter, endpoint: &str) -> Result<String> {
    let request = metadata_request(endpoint, MDS_PROJECT_ID_PATH)?;
    let response = transport::send(
        transporter,
        request,
        "failed to retrieve the project id from the metadata service",
    )
    .await?;
    let project_id = String::from_utf8_lossy(response.body()).trim().to_string();
    if project_id.is_empty() {
        return Err(CredentialsError::from_msg(
            false,
            "the metadata service returned an empty project id",
        ));
    }
    Ok(project_id)
}
