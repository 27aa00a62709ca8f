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

//! The IDK proxy provider.
//!
//! Exchanges an authorization code (plus PKCE verifier) for an IDK token
//! and refreshes it, both against the IDK token endpoint. Every request is
//! form-encoded and carries the signed `x-qmauth` header, recomputed per
//! request.

use crate::errors::TokenError;
use crate::exchangers::fetch_token;
use crate::params;
use crate::signer::Signer;
use crate::token::{Token, TokenExchanger};
use crate::Result;
use http::header::ACCEPT;
use std::collections::HashMap;

/// Token endpoint of the production IDK proxy.
pub const TOKEN_URL: &str = "https://emea.bff.cariad.digital/login/v1/idk/token";

const SIGNATURE_HEADER: &str = "x-qmauth";

/// A builder for constructing an [Idk] exchanger.
///
/// # Example
/// ```no_run
/// # use vag_auth::exchangers::idk::Builder;
/// # use std::collections::HashMap;
/// let fixed = HashMap::from([("client_id".to_string(), "my-client".to_string())]);
/// let exchanger = Builder::new(fixed).build();
/// ```
pub struct Builder {
    fixed: HashMap<String, String>,
    token_uri: Option<String>,
    signer: Option<Signer>,
}

impl Builder {
    /// Creates a new builder with the parameters merged into every request,
    /// typically `client_id`, `redirect_uri`, and `scope`.
    pub fn new(fixed: HashMap<String, String>) -> Self {
        Self {
            fixed,
            token_uri: None,
            signer: None,
        }
    }

    /// Overrides the token endpoint. Defaults to [TOKEN_URL].
    pub fn with_token_uri<S: Into<String>>(mut self, token_uri: S) -> Self {
        self.token_uri = Some(token_uri.into());
        self
    }

    /// Overrides the request signer. Defaults to the production signer.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn build(self) -> Idk {
        Idk {
            client: reqwest::Client::new(),
            token_uri: self.token_uri.unwrap_or_else(|| TOKEN_URL.to_string()),
            fixed: self.fixed,
            signer: self.signer.unwrap_or_default(),
        }
    }
}

/// Exchanges and refreshes tokens against the IDK proxy.
#[derive(Clone, Debug)]
pub struct Idk {
    client: reqwest::Client,
    token_uri: String,
    fixed: HashMap<String, String>,
    signer: Signer,
}

impl Idk {
    async fn post_form(&self, mut data: HashMap<String, String>) -> Result<Token> {
        params::merge(&mut data, &self.fixed);
        tracing::debug!(endpoint = %self.token_uri, "requesting IDK token");
        let builder = self
            .client
            .post(&self.token_uri)
            .header(ACCEPT, "application/json")
            .header(SIGNATURE_HEADER, self.signer.sign_now())
            .form(&data);
        fetch_token(builder).await
    }
}

#[async_trait::async_trait]
impl TokenExchanger for Idk {
    async fn exchange(&self, params: HashMap<String, String>) -> Result<Token> {
        params::require(&params, &["code", "code_verifier"])?;

        let data = HashMap::from(
            [
                ("grant_type", "authorization_code"),
                ("response_type", "token id_token"),
                ("code", params["code"].as_str()),
                ("code_verifier", params["code_verifier"].as_str()),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        self.post_form(data).await
    }

    async fn refresh(&self, token: Token) -> Result<Token> {
        if token.refresh_token.is_empty() {
            return Err(TokenError::no_refresh_token());
        }

        let data = HashMap::from(
            [
                ("grant_type", "refresh_token"),
                ("response_type", "token id_token"),
                ("refresh_token", token.refresh_token.as_str()),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        self.post_form(data).await
    }
}
