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
use crate::transport::{self, Transporter};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A map from key id to a PEM encoded certificate or public key.
pub(crate) type Certificates = Arc<HashMap<String, String>>;

/// Fetches a set of certificates once, and keeps it.
///
/// The cache has a single slot. It is populated by the first successful
/// fetch and never refreshed. A failed fetch leaves the slot empty, so the
/// next call tries again.
#[derive(Debug)]
pub(crate) struct CertificateCache {
    url: String,
    transporter: Arc<dyn Transporter>,
    certs: Mutex<Option<Certificates>>,
}

impl CertificateCache {
    pub(crate) fn new<S: Into<String>>(url: S, transporter: Arc<dyn Transporter>) -> Self {
        Self {
            url: url.into(),
            transporter,
            certs: Mutex::new(None),
        }
    }

    pub(crate) async fn get_certs(&self) -> Result<Certificates> {
        // Held across the fetch, concurrent callers wait for its result.
        let mut slot = self.certs.lock().await;
        if let Some(certs) = slot.as_ref() {
            return Ok(certs.clone());
        }
        tracing::debug!(url = %self.url, "fetching certificates");
        let request = transport::build(transport::get(&self.url), Bytes::new())?;
        let certs: HashMap<String, String> = transport::send_json(
            self.transporter.as_ref(),
            request,
            "failed to retrieve the federated signon certificates",
        )
        .await
        .inspect_err(|e| tracing::warn!(url = %self.url, "cannot fetch certificates: {e}"))?;
        let certs = Arc::new(certs);
        *slot = Some(certs.clone());
        Ok(certs)
    }
}
