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

//! Provider implementations of [TokenExchanger][crate::token::TokenExchanger].
//!
//! The providers differ only in endpoint, required parameter keys, header
//! set, and whether requests are signed. They share the execution and
//! decoding step in this module.

use crate::Result;
use crate::errors::TokenError;
use crate::token::Token;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

pub mod idk;
pub mod refresh_service;

/// Decodes the token endpoint response.
///
/// `expires_in` is seconds-until-expiry and is converted to an absolute
/// instant at receipt time.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    expires_in: u64,
}

impl TokenResponse {
    fn into_token(self) -> Result<Token> {
        if self.access_token.is_empty() {
            return Err(TokenError::decode_from_str(
                "token endpoint response carried an empty access_token",
            ));
        }
        // Any u64 deserializes into `expires_in`; an absurd value from a
        // misbehaving server must not overflow the expiry arithmetic.
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(self.expires_in))
            .ok_or_else(|| {
                TokenError::decode_from_str(format!(
                    "token endpoint response carried an unrepresentable expires_in of {}",
                    self.expires_in
                ))
            })?;
        Ok(Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            id_token: self.id_token,
            expires_at,
        })
    }
}

/// Sends a prepared token request and decodes the response into a [Token].
///
/// Transport failures are retryable exchange errors. Non-success statuses
/// are classified by status code. A body that does not parse as the token
/// shape is a permanent decode error.
pub(crate) async fn fetch_token(builder: reqwest::RequestBuilder) -> Result<Token> {
    let resp = builder.send().await.map_err(TokenError::transport)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(%status, "token endpoint rejected the request");
        return Err(TokenError::exchange_status(status, body));
    }

    let response = resp.json::<TokenResponse>().await.map_err(|e| {
        if e.is_decode() {
            TokenError::decode(e)
        } else {
            TokenError::transport(e)
        }
    })?;
    response.into_token()
}
