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

//! Verify Google-signed ID tokens.
//!
//! Verification is a pure function of the token, the certificates, and the
//! expected claims. Fetching the certificates is the caller's concern; the
//! [OAuth2 client](crate::credentials::oauth2::OAuth2Client) caches them.
//!
//! ## Example
//!
//! ```
//! # use google_cloud_adc::credentials::idtoken::verifier::{Verifier, ValidationError};
//! # use google_cloud_adc::credentials::idtoken::LoginTicket;
//! # use std::collections::HashMap;
//! fn check(token: &str, certs: &HashMap<String, String>) -> Result<LoginTicket, ValidationError> {
//!     Verifier::new("my-client-id.apps.googleusercontent.com")
//!         .with_issuers(["accounts.google.com", "https://accounts.google.com"])
//!         .verify(token, certs)
//! }
//! ```

use super::LoginTicket;
use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// The tolerated difference between the clocks of the issuer and the
/// verifier, in seconds.
pub const CLOCK_SKEW_SECS: i64 = 300;

/// The default maximum lifetime of a token (`exp - iat`), in seconds.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86400;

/// The acceptable values for the `aud` claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    /// The claim must be equal to this value.
    One(String),
    /// The claim must be equal to one of these values.
    Any(Vec<String>),
}

impl Audience {
    fn accepts(&self, aud: &str) -> bool {
        match self {
            Audience::One(expected) => expected == aud,
            Audience::Any(expected) => expected.iter().any(|e| e == aud),
        }
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::One(value.to_string())
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Audience::One(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for Audience {
    fn from(value: Vec<S>) -> Self {
        Audience::Any(value.into_iter().map(Into::into).collect())
    }
}

/// The reasons an ID token fails verification.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The token is not three base64url segments, or a segment is not JSON.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
    /// No certificate matches the `kid` in the token header.
    #[error("no certificate found for key id {0:?}")]
    UnknownSigner(Option<String>),
    /// The signature does not match the signed content.
    #[error("invalid token signature")]
    InvalidSignature,
    /// The token has no `exp` claim.
    #[error("no expiration time in token")]
    MissingExpiration,
    /// The token has no `iat` claim.
    #[error("no issue time in token")]
    MissingIssueTime,
    /// The token was issued in the future.
    #[error("token used too early, {now} < {earliest}")]
    UsedTooEarly {
        /// The verification time, in seconds since the epoch.
        now: i64,
        /// The earliest acceptable time.
        earliest: i64,
    },
    /// The token has expired.
    #[error("token used too late, {now} > {latest}")]
    UsedTooLate {
        /// The verification time, in seconds since the epoch.
        now: i64,
        /// The latest acceptable time.
        latest: i64,
    },
    /// The difference between `exp` and `iat` is too large.
    #[error("expiration time too far in future, lifetime {lifetime}s exceeds {max}s")]
    ExpiryTooFarInFuture {
        /// `exp - iat`, in seconds.
        lifetime: i64,
        /// The maximum lifetime, in seconds.
        max: i64,
    },
    /// The `iss` claim is not one of the accepted issuers.
    #[error("invalid issuer, expected one of {expected:?}, but got {actual:?}")]
    InvalidIssuer {
        /// The accepted issuers.
        expected: Vec<String>,
        /// The `iss` claim.
        actual: Option<String>,
    },
    /// The `aud` claim does not match the expected audience.
    #[error("wrong recipient, payload audience {actual:?} does not match the expected audience")]
    WrongRecipient {
        /// The `aud` claim.
        actual: Option<String>,
    },
}

/// Verifies ID tokens against a set of expected claims.
#[derive(Clone, Debug)]
pub struct Verifier {
    audience: Audience,
    issuers: Option<Vec<String>>,
    max_expiry: Duration,
}

impl Verifier {
    /// Creates a verifier accepting tokens for `audience`, from any issuer.
    pub fn new<A: Into<Audience>>(audience: A) -> Self {
        Self {
            audience: audience.into(),
            issuers: None,
            max_expiry: Duration::from_secs(MAX_TOKEN_LIFETIME_SECS as u64),
        }
    }

    /// Only accepts tokens whose `iss` claim is one of `issuers`.
    ///
    /// An empty list rejects every token.
    pub fn with_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issuers = Some(issuers.into_iter().map(Into::into).collect());
        self
    }

    /// Changes the maximum token lifetime, the default is 24 hours.
    pub fn with_max_expiry(mut self, max_expiry: Duration) -> Self {
        self.max_expiry = max_expiry;
        self
    }

    /// Verifies `token` using `certs`, a map from key id to PEM encoded
    /// public key or X.509 certificate.
    pub fn verify(
        &self,
        token: &str,
        certs: &HashMap<String, String>,
    ) -> Result<LoginTicket, ValidationError> {
        self.verify_at(token, certs, time::OffsetDateTime::now_utc().unix_timestamp())
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        certs: &HashMap<String, String>,
        now: i64,
    ) -> Result<LoginTicket, ValidationError> {
        let segments: Vec<&str> = token.split('.').collect();
        let &[envelope_b64, payload_b64, signature_b64] = segments.as_slice() else {
            return Err(ValidationError::MalformedToken("wrong number of segments"));
        };
        let envelope = decode_json(envelope_b64)
            .ok_or(ValidationError::MalformedToken("can't parse envelope"))?;
        let payload = decode_json(payload_b64)
            .ok_or(ValidationError::MalformedToken("can't parse payload"))?;

        let kid = envelope.get("kid").and_then(Value::as_str);
        let cert = kid
            .and_then(|k| certs.get(k))
            .ok_or_else(|| ValidationError::UnknownSigner(kid.map(str::to_string)))?;
        let signed = &token[..envelope_b64.len() + 1 + payload_b64.len()];
        if !verify_signature(cert, signed, signature_b64) {
            return Err(ValidationError::InvalidSignature);
        }

        let exp = numeric_claim(&payload, "exp").ok_or(ValidationError::MissingExpiration)?;
        let iat = numeric_claim(&payload, "iat").ok_or(ValidationError::MissingIssueTime)?;

        let earliest = iat.saturating_sub(CLOCK_SKEW_SECS);
        if now < earliest {
            return Err(ValidationError::UsedTooEarly { now, earliest });
        }
        let latest = exp.saturating_add(CLOCK_SKEW_SECS);
        if now > latest {
            return Err(ValidationError::UsedTooLate { now, latest });
        }
        let max = i64::try_from(self.max_expiry.as_secs()).unwrap_or(i64::MAX);
        let lifetime = exp.saturating_sub(iat);
        if lifetime > max {
            return Err(ValidationError::ExpiryTooFarInFuture { lifetime, max });
        }

        if let Some(issuers) = &self.issuers {
            let iss = payload.get("iss").and_then(Value::as_str);
            if !iss.is_some_and(|iss| issuers.iter().any(|i| i == iss)) {
                return Err(ValidationError::InvalidIssuer {
                    expected: issuers.clone(),
                    actual: iss.map(str::to_string),
                });
            }
        }

        let accepted = match payload.get("aud") {
            Some(Value::String(aud)) => self.audience.accepts(aud),
            Some(Value::Array(auds)) => auds
                .iter()
                .filter_map(Value::as_str)
                .any(|aud| self.audience.accepts(aud)),
            _ => false,
        };
        if !accepted {
            let actual = payload.get("aud").map(|aud| match aud {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            return Err(ValidationError::WrongRecipient { actual });
        }

        Ok(LoginTicket::new(Some(envelope), Some(payload)))
    }
}

/// Verifies `token`, see [Verifier].
///
/// `issuers` restricts the accepted `iss` claims, and `max_expiry` replaces
/// the default maximum lifetime of 24 hours.
pub fn verify(
    token: &str,
    certs: &HashMap<String, String>,
    audience: impl Into<Audience>,
    issuers: Option<&[&str]>,
    max_expiry: Option<Duration>,
) -> Result<LoginTicket, ValidationError> {
    let mut verifier = Verifier::new(audience);
    if let Some(issuers) = issuers {
        verifier = verifier.with_issuers(issuers.iter().copied());
    }
    if let Some(max_expiry) = max_expiry {
        verifier = verifier.with_max_expiry(max_expiry);
    }
    verifier.verify(token, certs)
}

// Accepts both base64 alphabets, with or without padding.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    BASE64_URL_SAFE_NO_PAD.decode(normalized).ok()
}

fn decode_json(segment: &str) -> Option<Value> {
    serde_json::from_slice(&decode_segment(segment)?).ok()
}

fn numeric_claim(payload: &Value, name: &str) -> Option<i64> {
    let value = payload.get(name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
}

fn verify_signature(cert: &str, signed: &str, signature: &str) -> bool {
    let Some(signature) = decode_segment(signature) else {
        return false;
    };
    let Ok(key) = DecodingKey::from_rsa_pem(cert.as_bytes()) else {
        tracing::warn!("cannot parse the certificate for the token key id");
        return false;
    };
    jsonwebtoken::crypto::verify(
        &BASE64_URL_SAFE_NO_PAD.encode(signature),
        signed.as_bytes(),
        &key,
        Algorithm::RS256,
    )
    .unwrap_or(false)
}
