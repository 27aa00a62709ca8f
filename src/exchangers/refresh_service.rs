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

//! The token refresh service provider.
//!
//! Exchanges an identity token (plus authorization code) for a brand token
//! via a JSON request, and refreshes it through the shared token refresh
//! service with a form-encoded request. No request signing is involved.

use crate::errors::TokenError;
use crate::exchangers::fetch_token;
use crate::params;
use crate::token::{Token, TokenExchanger};
use crate::Result;
use http::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT};
use std::collections::HashMap;

/// Endpoint of the shared token refresh service.
pub const REFRESH_URL: &str =
    "https://tokenrefreshservice.apps.emea.vwapps.io/refreshTokens";

/// Endpoint exchanging an identity token for a brand token.
pub const EXCHANGE_URL: &str =
    "https://api.connect.skoda-auto.cz/api/v1/authentication/token?systemId=TECHNICAL";

// The exchange endpoint expects the mobile app's client fingerprint.
const EXCHANGE_USER_AGENT: &str = "OneConnect/000000117 CFNetwork/1240.0.4 Darwin/20.6.0";

#[derive(serde::Serialize)]
struct ExchangeRequest {
    #[serde(rename = "authorizationCode")]
    authorization_code: String,
}

/// A builder for constructing a [RefreshService] exchanger.
pub struct Builder {
    fixed: HashMap<String, String>,
    exchange_uri: Option<String>,
    refresh_uri: Option<String>,
}

impl Builder {
    /// Creates a new builder with the parameters merged into every refresh
    /// request, typically `brand` and `vin`-independent client settings.
    pub fn new(fixed: HashMap<String, String>) -> Self {
        Self {
            fixed,
            exchange_uri: None,
            refresh_uri: None,
        }
    }

    /// Overrides the exchange endpoint. Defaults to [EXCHANGE_URL].
    pub fn with_exchange_uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.exchange_uri = Some(uri.into());
        self
    }

    /// Overrides the refresh endpoint. Defaults to [REFRESH_URL].
    pub fn with_refresh_uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.refresh_uri = Some(uri.into());
        self
    }

    pub fn build(self) -> RefreshService {
        RefreshService {
            client: reqwest::Client::new(),
            exchange_uri: self
                .exchange_uri
                .unwrap_or_else(|| EXCHANGE_URL.to_string()),
            refresh_uri: self.refresh_uri.unwrap_or_else(|| REFRESH_URL.to_string()),
            fixed: self.fixed,
        }
    }
}

/// Exchanges tokens via the brand endpoint and refreshes them via the
/// shared token refresh service.
#[derive(Clone, Debug)]
pub struct RefreshService {
    client: reqwest::Client,
    exchange_uri: String,
    refresh_uri: String,
    fixed: HashMap<String, String>,
}

#[async_trait::async_trait]
impl TokenExchanger for RefreshService {
    async fn exchange(&self, params: HashMap<String, String>) -> Result<Token> {
        params::require(&params, &["id_token", "code"])?;

        let body = ExchangeRequest {
            authorization_code: params["code"].clone(),
        };
        tracing::debug!(endpoint = %self.exchange_uri, "exchanging identity token");
        let builder = self
            .client
            .post(&self.exchange_uri)
            .header(AUTHORIZATION, format!("Bearer {}", params["id_token"]))
            .header(USER_AGENT, EXCHANGE_USER_AGENT)
            .header(ACCEPT_LANGUAGE, "de-de")
            .header(ACCEPT, "*/*")
            .json(&body);
        fetch_token(builder).await
    }

    async fn refresh(&self, token: Token) -> Result<Token> {
        if token.refresh_token.is_empty() {
            return Err(TokenError::no_refresh_token());
        }

        let mut data = HashMap::from(
            [
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.as_str()),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        params::merge(&mut data, &self.fixed);

        tracing::debug!(endpoint = %self.refresh_uri, "refreshing brand token");
        let builder = self.client.post(&self.refresh_uri).form(&data);
        fetch_token(builder).await
    }
}
