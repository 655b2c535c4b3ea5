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

// Environment variables.
pub(crate) const GOOGLE_APPLICATION_CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub(crate) const GCLOUD_PROJECT_VAR: &str = "GCLOUD_PROJECT";
pub(crate) const GOOGLE_CLOUD_PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub(crate) const APPDATA_VAR: &str = "APPDATA";
pub(crate) const HOME_VAR: &str = "HOME";
pub(crate) const GCE_METADATA_HOST_VAR: &str = "GCE_METADATA_HOST";

// The well-known file, relative to the user's config directory.
pub(crate) const CLOUDSDK_CONFIG_DIR: &str = "gcloud";
pub(crate) const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

// OAuth2 endpoints.
pub(crate) const OAUTH2_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub(crate) const OAUTH2_AUTH_BASE_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub(crate) const OAUTH2_REVOKE_URI: &str = "https://accounts.google.com/o/oauth2/revoke";
pub(crate) const OAUTH2_FEDERATED_SIGNON_CERTS_URI: &str =
    "https://www.googleapis.com/oauth2/v1/certs";

/// Issuers Google uses in the ID tokens it signs.
pub(crate) const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

pub(crate) const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub(crate) const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";
pub(crate) const AUTHORIZATION_CODE_GRANT_TYPE: &str = "authorization_code";

/// Lifetime of the JWTs we sign, in seconds.
pub(crate) const JWT_LIFETIME_SECS: i64 = 3600;

// Metadata server.
pub(crate) const METADATA_ROOT: &str = "http://metadata.google.internal";
pub(crate) const METADATA_FLAVOR: &str = "metadata-flavor";
pub(crate) const METADATA_FLAVOR_VALUE: &str = "Google";
pub(crate) const MDS_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";
pub(crate) const MDS_PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";

// Placeholder refresh tokens. Variants that mint tokens without a real
// refresh token still report one, so a 401/403 response triggers a refresh.
pub(crate) const COMPUTE_PLACEHOLDER_REFRESH_TOKEN: &str = "compute-placeholder";
pub(crate) const JWT_PLACEHOLDER_REFRESH_TOKEN: &str = "jwt-placeholder";

// IAM headers.
pub(crate) const IAM_AUTHORITY_SELECTOR_HEADER: &str = "x-goog-iam-authority-selector";
pub(crate) const IAM_AUTHORIZATION_TOKEN_HEADER: &str = "x-goog-iam-authorization-token";

pub(crate) const DEFAULT_TOKEN_TYPE: &str = "Bearer";

pub(crate) const USER_AGENT: &str = concat!("google-cloud-adc/", env!("CARGO_PKG_VERSION"));
