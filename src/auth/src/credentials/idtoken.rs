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

//! Google-issued OpenID Connect ID tokens.
//!
//! An ID token is a signed JWT asserting the identity of a user or service
//! account. Use [verifier::verify] with the current Google certificates to
//! check the token, then inspect the claims through the returned
//! [LoginTicket].

pub mod verifier;

use serde_json::Value;

/// The result of a successful ID token verification.
///
/// A ticket may also be constructed without a payload. Such a ticket has no
/// user id, and callers use it to represent the absence of an ID token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginTicket {
    envelope: Option<Value>,
    payload: Option<Value>,
}

impl LoginTicket {
    /// Creates a ticket from a decoded envelope (the JWT header) and payload.
    pub fn new(envelope: Option<Value>, payload: Option<Value>) -> Self {
        Self { envelope, payload }
    }

    /// The decoded JWT header.
    pub fn envelope(&self) -> Option<&Value> {
        self.envelope.as_ref()
    }

    /// The decoded JWT claims.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// The `sub` claim, a unique and stable identifier for the user.
    ///
    /// Returns `None` when the ticket has no payload.
    pub fn user_id(&self) -> Option<&str> {
        self.claim("sub")
    }

    /// The `iss` claim.
    pub fn issuer(&self) -> Option<&str> {
        self.claim("iss")
    }

    /// The `aud` claim, when it is a single string.
    pub fn audience(&self) -> Option<&str> {
        self.claim("aud")
    }

    /// The `azp` claim, the client id of the authorized presenter.
    pub fn authorized_party(&self) -> Option<&str> {
        self.claim("azp")
    }

    /// The `email` claim.
    pub fn email(&self) -> Option<&str> {
        self.claim("email")
    }

    fn claim(&self, name: &str) -> Option<&str> {
        self.payload.as_ref()?.get(name)?.as_str()
    }
}
