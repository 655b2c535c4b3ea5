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

//! Google Cloud Application Default Credentials for Rust
//!
//! This crate finds credentials for an application running on, or talking
//! to, Google Cloud, and keeps the bearer tokens minted from those
//! credentials fresh.
//!
//! [Application Default Credentials] (ADC) is the strategy Google Cloud
//! client libraries use to locate credentials without explicit
//! configuration. The [resolver::Resolver] tries, in order:
//!
//! 1. credentials JSON supplied directly by the application,
//! 1. the file named by the `GOOGLE_APPLICATION_CREDENTIALS` environment
//!    variable,
//! 1. the well-known file written by `gcloud auth application-default login`,
//! 1. the metadata server, when running on Google Compute Engine.
//!
//! The result is a [credentials::Credentials] handle. It produces the
//! headers to authenticate a request, refreshing the underlying access token
//! only when it is missing or expired.
//!
//! The crate also verifies Google-signed ID tokens, see
//! [credentials::idtoken].
//!
//! # Example
//!
//! ```no_run
//! # use google_cloud_adc::resolver::Resolver;
//! # tokio_test::block_on(async {
//! let resolver = Resolver::builder().build();
//! let credentials = resolver.application_default().await?;
//! let headers = credentials.headers(None).await?;
//! println!("{:?}", headers.get(http::header::AUTHORIZATION).is_some());
//! # Ok::<(), anyhow::Error>(())
//! # });
//! ```
//!
//! [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials

pub mod errors;

/// Errors creating credentials from JSON files or streams.
pub mod build_errors;

/// Types and functions to work with Google Cloud authentication [Credentials].
///
/// [Credentials]: https://cloud.google.com/docs/authentication#credentials
pub mod credentials;

/// Types and functions to work with auth [Tokens].
///
/// [Tokens]: https://cloud.google.com/docs/authentication#token
pub mod token;

/// Application Default Credentials resolution.
pub mod resolver;

/// The capabilities the resolver uses to inspect its environment.
pub mod environment;

/// The HTTP transport used to refresh tokens and call metadata endpoints.
pub mod transport;

pub(crate) mod constants;

/// Headers utility functions to work with Google Cloud authentication [Credentials].
///
/// [Credentials]: https://cloud.google.com/docs/authentication#credentials
pub(crate) mod headers_util;

/// The token holder.
pub(crate) mod token_cache;

/// A `Result` alias where the `Err` case is
/// `google_cloud_adc::errors::CredentialsError`.
pub type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;
