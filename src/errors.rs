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

use http::StatusCode;
use std::error::Error;
use std::fmt::{Display, Formatter, Result};
use std::sync::Arc;

/// Distinguishes the failure classes of a token exchange or refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenErrorKind {
    /// The caller omitted a parameter the provider requires. Detected before
    /// any I/O and never worth retrying with the same input.
    #[error("missing required exchange parameter")]
    MissingParameter,
    /// A refresh was attempted on a token that carries no refresh credential.
    /// Fatal for that token; the login flow must be run again.
    #[error("token carries no refresh credential")]
    NoRefreshToken,
    /// The identity endpoint could not be reached or rejected the request.
    #[error("token endpoint exchange failed")]
    ExchangeFailed,
    /// The response body did not parse as the expected token shape. Usually
    /// a protocol mismatch, so it is treated as permanent.
    #[error("cannot decode token endpoint response")]
    DecodeFailed,
}

/// Represents an error exchanging or refreshing a [Token][crate::token::Token].
///
/// Errors surface unmodified from
/// [TokenExchanger][crate::token::TokenExchanger] operations and from
/// [TokenSource::token][crate::token_source::TokenSource::token]. The crate
/// never retries internally; callers can consult [is_retryable][TokenError::is_retryable]
/// to decide whether another attempt may succeed.
#[derive(Clone, Debug)]
pub struct TokenError {
    kind: TokenErrorKind,
    is_retryable: bool,
    source: TokenErrorImpl,
}

#[derive(Clone, Debug)]
enum TokenErrorImpl {
    SimpleMessage(String),
    Source(Arc<dyn Error + Send + Sync>),
}

impl TokenError {
    pub(crate) fn new<T: Error + Send + Sync + 'static>(
        kind: TokenErrorKind,
        is_retryable: bool,
        source: T,
    ) -> Self {
        TokenError {
            kind,
            is_retryable,
            source: TokenErrorImpl::Source(Arc::new(source)),
        }
    }

    pub(crate) fn from_str<T: Into<String>>(
        kind: TokenErrorKind,
        is_retryable: bool,
        message: T,
    ) -> Self {
        TokenError {
            kind,
            is_retryable,
            source: TokenErrorImpl::SimpleMessage(message.into()),
        }
    }

    /// A required exchange parameter was absent from the caller's set.
    pub(crate) fn missing_parameter(name: &str) -> Self {
        TokenError::from_str(
            TokenErrorKind::MissingParameter,
            false,
            format!("parameter `{name}` is required but was not supplied"),
        )
    }

    /// Refresh was requested for a token without a refresh credential.
    pub(crate) fn no_refresh_token() -> Self {
        TokenError::from_str(
            TokenErrorKind::NoRefreshToken,
            false,
            "the held token has an empty refresh_token",
        )
    }

    /// Wraps a transport-level failure talking to the token endpoint.
    pub(crate) fn transport<T: Error + Send + Sync + 'static>(source: T) -> Self {
        TokenError::new(TokenErrorKind::ExchangeFailed, true, source)
    }

    /// The endpoint answered with a non-success status.
    pub(crate) fn exchange_status<T: Into<String>>(status: StatusCode, body: T) -> Self {
        TokenError::from_str(
            TokenErrorKind::ExchangeFailed,
            is_retryable(status),
            format!("token endpoint returned {status}: {}", body.into()),
        )
    }

    /// The response body was not the expected token shape.
    pub(crate) fn decode<T: Error + Send + Sync + 'static>(source: T) -> Self {
        TokenError::new(TokenErrorKind::DecodeFailed, false, source)
    }

    pub(crate) fn decode_from_str<T: Into<String>>(message: T) -> Self {
        TokenError::from_str(TokenErrorKind::DecodeFailed, false, message)
    }

    /// Returns which failure class this error belongs to.
    pub fn kind(&self) -> TokenErrorKind {
        self.kind
    }

    /// Returns `true` if the error is retryable; otherwise returns `false`.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }
}

impl Error for TokenErrorImpl {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            TokenErrorImpl::SimpleMessage(_) => None,
            TokenErrorImpl::Source(source) => Some(source),
        }
    }
}

impl Display for TokenErrorImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self {
            TokenErrorImpl::SimpleMessage(message) => write!(f, "{}", message),
            TokenErrorImpl::Source(source) => write!(f, "{}", source),
        }
    }
}

impl Error for TokenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.source()
    }
}

const RETRYABLE_MSG: &str = "but future attempts may succeed";
const NON_RETRYABLE_MSG: &str = "and future attempts will not succeed";

impl Display for TokenError {
    /// Formats the error message to include the kind, retryability and source.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = if self.is_retryable {
            RETRYABLE_MSG
        } else {
            NON_RETRYABLE_MSG
        };
        write!(f, "{}, {}, source:{}", self.kind, msg, self.source)
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}
