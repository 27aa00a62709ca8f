// Copyright 2025 Google LLC
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

//! The bucketed HMAC request signature used by the IDK proxy.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

/// Version tag prefixed to every signature.
const SIGNATURE_VERSION: &str = "v1";

/// Timestamps are bucketed to this many seconds, so requests within the same
/// window produce an identical signature without tight clock sync.
const BUCKET_SECS: u64 = 100;

// Secret and client id of the production IDK proxy.
const QM_SECRET: [u8; 32] = [
    26, 182, 153, 37, 172, 23, 154, 170, 78, 131, 171, 230, 113, 169, 71, 109, 23, 100, 24, 184,
    91, 215, 6, 241, 67, 108, 161, 91, 230, 71, 152, 156,
];
const QM_CLIENT_ID: &str = "01da27b0";

/// Computes the `x-qmauth` request signature for the IDK proxy.
///
/// The signature is an HMAC-SHA256 over the decimal rendering of a coarse
/// time bucket, hex-encoded and prefixed with a version tag and client id:
/// `"v1:<client_id>:<lowercase-hex-hmac>"`. It must be recomputed on every
/// outbound signed request.
///
/// [Signer::default] carries the production secret; tests and alternate
/// deployments can substitute their own via [Signer::new].
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
    client_id: String,
}

impl Default for Signer {
    fn default() -> Self {
        Signer::new(QM_SECRET.to_vec(), QM_CLIENT_ID)
    }
}

impl Signer {
    pub fn new<S: Into<String>>(secret: Vec<u8>, client_id: S) -> Self {
        Signer {
            secret,
            client_id: client_id.into(),
        }
    }

    /// Signs the bucket containing `unix_secs`.
    pub fn sign_at(&self, unix_secs: u64) -> String {
        // HMAC accepts keys of any length, this cannot fail.
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update((unix_secs / BUCKET_SECS).to_string().as_bytes());
        let hex = hex::encode(mac.finalize().into_bytes());
        format!("{SIGNATURE_VERSION}:{}:{hex}", self.client_id)
    }

    /// Signs the current time bucket.
    pub fn sign_now(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is set after the unix epoch")
            .as_secs();
        self.sign_at(now)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"[censored]")
            .field("client_id", &self.client_id)
            .finish()
    }
}
