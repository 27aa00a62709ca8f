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

//! The token data model and the per-provider exchange capability.

use crate::Result;
use std::collections::HashMap;
use std::time::Duration;
// Using tokio's wrapper makes expiry logic testable without relying on clock
// times.
use tokio::time::Instant;

/// An access/refresh token pair issued by a VAG identity service.
///
/// A `Token` is immutable once constructed; a refresh produces a new value
/// that replaces the old one wholesale.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// The opaque bearer credential presented to the vehicle APIs.
    ///
    /// Non-empty after a successful exchange or refresh.
    pub access_token: String,

    /// The opaque credential used to obtain a new `access_token`.
    ///
    /// Empty when the provider does not support refresh; refreshing such a
    /// token fails with [TokenErrorKind::NoRefreshToken][crate::errors::TokenErrorKind::NoRefreshToken].
    pub refresh_token: String,

    /// An identity token, present for some providers.
    ///
    /// Not consumed by this crate, only passed through to callers that need
    /// it (for example to seed another provider's exchange).
    pub id_token: Option<String>,

    /// The instant after which `access_token` must be considered invalid.
    ///
    /// Computed from the provider's `expires_in` seconds at receipt time.
    /// Note that an `Instant` is not valid across processes; persisting
    /// tokens is the caller's responsibility, and a persisted expiry should
    /// be converted to wall-clock time first.
    pub expires_at: Instant,
}

impl Token {
    /// Returns `true` if the token is still usable `margin` from now.
    pub fn is_valid_for(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("id_token", &self.id_token.as_ref().map(|_| "[censored]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The per-provider exchange capability.
///
/// Each identity provider implements this against its own endpoint and
/// header set; a [TokenSource][crate::token_source::TokenSource] can drive
/// any of them interchangeably. Implementations are stateless beyond the
/// fixed configuration injected at construction.
#[async_trait::async_trait]
pub trait TokenExchanger: std::fmt::Debug + Send + Sync {
    /// Converts an authorization artifact into an initial token pair.
    ///
    /// `params` must contain the provider's required keys (for example
    /// `code` + `code_verifier`); missing keys fail before any network call.
    async fn exchange(&self, params: HashMap<String, String>) -> Result<Token>;

    /// Obtains a new token pair from `token`'s refresh credential.
    async fn refresh(&self, token: Token) -> Result<Token>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Used by tests in other modules.
    mockall::mock! {
        #[derive(Debug)]
        pub Exchanger { }

        #[async_trait::async_trait]
        impl TokenExchanger for Exchanger {
            async fn exchange(&self, params: HashMap<String, String>) -> Result<Token>;
            async fn refresh(&self, token: Token) -> Result<Token>;
        }
    }

    #[tokio::test]
    async fn debug_censors_credentials() {
        let token = Token {
            access_token: "access-test-only".into(),
            refresh_token: "refresh-test-only".into(),
            id_token: Some("id-test-only".into()),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        let got = format!("{token:?}");
        assert!(!got.contains("access-test-only"), "{got}");
        assert!(!got.contains("refresh-test-only"), "{got}");
        assert!(!got.contains("id-test-only"), "{got}");
        assert!(got.contains("[censored]"), "{got}");
        assert!(got.contains("expires_at"), "{got}");
    }

    #[tokio::test(start_paused = true)]
    async fn validity_window() {
        let token = Token {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            id_token: None,
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(token.is_valid_for(Duration::from_secs(10)));
        assert!(!token.is_valid_for(Duration::from_secs(60)));

        tokio::time::advance(Duration::from_secs(55)).await;
        assert!(!token.is_valid_for(Duration::from_secs(10)));
    }
}
