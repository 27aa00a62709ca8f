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

//! Token exchange and refresh for VW-group (VAG) identity services.
//!
//! VAG vehicle APIs authenticate with short-lived access tokens issued by a
//! handful of identity services, each with its own request shape, header set,
//! and (for one of them) a custom per-request signature. This crate covers
//! the token lifecycle once the interactive login leg has produced an
//! authorization artifact:
//!
//! * [exchangers] implement the [token::TokenExchanger] capability per
//!   provider, converting an authorization code (or a previously issued
//!   identity token) into an access/refresh token pair.
//! * [token_source::TokenSource] wraps an exchanger and a current
//!   [token::Token], handing out a valid access token on demand and
//!   refreshing transparently when the held token is stale.
//!
//! The interactive leg itself (browser redirect, consent) and persistence of
//! tokens across process restarts are out of scope; callers obtain the
//! initial token elsewhere and seed a `TokenSource` with it.

pub mod errors;

/// The token data model and the per-provider exchange capability.
pub mod token;

/// Provider implementations of [token::TokenExchanger].
pub mod exchangers;

/// Helpers for the string parameter sets passed to an exchange.
pub mod params;

/// The bucketed HMAC request signature used by the IDK proxy.
pub mod signer;

/// A caching token source that refreshes on read.
pub mod token_source;

/// A `Result` alias where the `Err` case is [errors::TokenError].
pub type Result<T> = std::result::Result<T, errors::TokenError>;
