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

//! Signed JWTs: the assertions exchanged for access tokens, and the
//! self-signed bearer tokens used by JWT access credentials.

use crate::Result;
use crate::constants::JWT_LIFETIME_SECS;
use crate::errors::CredentialsError;
use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use rustls::SignatureScheme;
use rustls::crypto::{CryptoProvider, KeyProvider};
use rustls::sign::Signer;
use rustls_pki_types::PrivateKeyDer;
use rustls_pki_types::pem::PemObject;
use serde::Serialize;
use time::OffsetDateTime;

/// The claims in a JWT signed with a service account key.
#[derive(Debug, Serialize)]
pub(crate) struct JwsClaims<'a> {
    pub iss: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<&'a str>,
    pub aud: &'a str,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<&'a str>,
}

impl<'a> JwsClaims<'a> {
    /// Claims issued now, valid for one hour.
    pub(crate) fn new(iss: &'a str, aud: &'a str) -> Self {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss,
            scope: None,
            aud,
            exp: iat + JWT_LIFETIME_SECS,
            iat,
            sub: None,
        }
    }
}

/// The header that describes how a token was signed.
#[derive(Debug, Serialize)]
struct JwsHeader<'a> {
    alg: &'a str,
    typ: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| CredentialsError::from_source(false, e))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json))
}

/// Produces `header.claims.signature`, signed with RS256.
///
/// The same signed JWT is either sent to a token endpoint as an assertion,
/// or used directly as a bearer token.
pub(crate) fn sign_jwt(private_key: &str, key_id: Option<&str>, claims: &JwsClaims) -> Result<String> {
    let header = JwsHeader {
        alg: "RS256",
        typ: "JWT",
        kid: key_id.filter(|k| !k.is_empty()),
    };
    let signing_input = format!("{}.{}", encode(&header)?, encode(claims)?);
    let signature = signer(private_key)?
        .sign(signing_input.as_bytes())
        .map_err(|e| CredentialsError::from_source(false, e).with_context("cannot sign JWT"))?;
    Ok(format!(
        "{signing_input}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(signature)
    ))
}

// Creates a signer from a PEM encoded RSA private key, PKCS#1 or PKCS#8.
fn signer(private_key: &str) -> Result<Box<dyn Signer>> {
    let key = PrivateKeyDer::from_pem_slice(private_key.as_bytes()).map_err(|e| {
        CredentialsError::configuration(e).with_context("cannot parse the private key")
    })?;
    let signing_key = key_provider()?
        .load_private_key(key)
        .map_err(|e| CredentialsError::configuration(e).with_context("cannot load the private key"))?;
    signing_key
        .choose_scheme(&[SignatureScheme::RSA_PKCS1_SHA256])
        .ok_or_else(|| {
            CredentialsError::configuration_msg(
                "the private key does not support the RSA_PKCS1_SHA256 signing scheme",
            )
        })
}

fn key_provider() -> Result<&'static dyn KeyProvider> {
    match CryptoProvider::get_default() {
        Some(provider) => Ok(provider.key_provider),
        None => default_key_provider(),
    }
}

#[cfg(feature = "default-rustls-provider")]
fn default_key_provider() -> Result<&'static dyn KeyProvider> {
    Ok(rustls::crypto::aws_lc_rs::default_provider().key_provider)
}

#[cfg(not(feature = "default-rustls-provider"))]
fn default_key_provider() -> Result<&'static dyn KeyProvider> {
    Err(CredentialsError::configuration_msg(
        "no rustls crypto provider is installed, call `rustls::crypto::CryptoProvider::install_default()`",
    ))
}
