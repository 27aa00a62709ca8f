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

//! A caching token source that refreshes on read.

use crate::Result;
use crate::token::{Token, TokenExchanger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tokens within this margin of expiry are treated as already expired, so a
/// token returned by [TokenSource::token] stays usable for the request it
/// authenticates.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

/// Hands out a currently valid access token, refreshing transparently.
///
/// A `TokenSource` is seeded with a token obtained out of band (via the
/// interactive login leg) and an exchanger for the provider that issued it.
/// Cloning is cheap and clones share the cached token, so one source can be
/// handed to every component issuing authenticated requests.
///
/// The check-and-refresh sequence runs under an internal mutex: at most one
/// refresh is in flight per source, and every concurrent caller observes
/// the same refreshed token. A failed refresh leaves the previously held
/// token in place and surfaces the error; there is no internal retry, the
/// next [token][TokenSource::token] call simply tries again.
#[derive(Clone, Debug)]
pub struct TokenSource {
    exchanger: Arc<dyn TokenExchanger>,
    current: Arc<Mutex<Token>>,
}

impl TokenSource {
    pub fn new(exchanger: Arc<dyn TokenExchanger>, initial: Token) -> Self {
        TokenSource {
            exchanger,
            current: Arc::new(Mutex::new(initial)),
        }
    }

    /// Returns a token valid at the instant of return.
    pub async fn token(&self) -> Result<Token> {
        let mut held = self.current.lock().await;
        if held.is_valid_for(EXPIRY_MARGIN) {
            return Ok(held.clone());
        }

        tracing::debug!("held token is stale, refreshing");
        let mut fresh = self.exchanger.refresh(held.clone()).await?;
        // Some providers omit the refresh token from a refresh response; the
        // previously issued credential stays valid and must be carried over.
        if fresh.refresh_token.is_empty() {
            fresh.refresh_token = held.refresh_token.clone();
        }
        *held = fresh.clone();
        Ok(fresh)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::{TokenError, TokenErrorKind};
    use crate::token::tests::MockExchanger;
    use tokio::time::Instant;

    const HOUR: Duration = Duration::from_secs(3600);

    fn token(access: &str, refresh: &str, valid_for: Duration) -> Token {
        Token {
            access_token: access.into(),
            refresh_token: refresh.into(),
            id_token: None,
            expires_at: Instant::now() + valid_for,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn valid_token_is_returned_unchanged() {
        // No expectations: any refresh call would panic.
        let mock = MockExchanger::new();
        let source = TokenSource::new(Arc::new(mock), token("AT1", "RT1", HOUR));

        let got = source.token().await.unwrap();
        assert_eq!(got.access_token, "AT1");

        // Idempotent: an immediate second call yields the same token and
        // performs no additional network call.
        let again = source.token().await.unwrap();
        assert_eq!(again, got);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_triggers_exactly_one_refresh() {
        let mut mock = MockExchanger::new();
        mock.expect_refresh()
            .withf(|held| held.access_token == "AT1" && held.refresh_token == "RT1")
            .times(1)
            .returning(|_| Ok(token("AT2", "RT2", HOUR)));

        let source = TokenSource::new(Arc::new(mock), token("AT1", "RT1", HOUR));

        tokio::time::advance(HOUR).await;
        let got = source.token().await.unwrap();
        assert_eq!(got.access_token, "AT2");
        assert_eq!(got.refresh_token, "RT2");

        // The refreshed token is cached; no second refresh.
        let again = source.token().await.unwrap();
        assert_eq!(again, got);
    }

    #[tokio::test(start_paused = true)]
    async fn token_within_expiry_margin_is_refreshed() {
        let mut mock = MockExchanger::new();
        mock.expect_refresh()
            .times(1)
            .returning(|_| Ok(token("AT2", "RT2", HOUR)));

        // Still technically unexpired, but inside the safety margin.
        let source = TokenSource::new(
            Arc::new(mock),
            token("AT1", "RT1", EXPIRY_MARGIN / 2),
        );

        let got = source.token().await.unwrap();
        assert_eq!(got.access_token, "AT2");
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_response_without_refresh_token_carries_old_one() {
        let mut mock = MockExchanger::new();
        mock.expect_refresh()
            .times(1)
            .returning(|_| Ok(token("AT2", "", HOUR)));

        let source = TokenSource::new(Arc::new(mock), token("AT1", "R1", Duration::ZERO));

        let got = source.token().await.unwrap();
        assert_eq!(got.access_token, "AT2");
        assert_eq!(got.refresh_token, "R1");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_stale_token_for_retry() {
        let mut mock = MockExchanger::new();
        mock.expect_refresh()
            .times(1)
            .returning(|_| Err(TokenError::no_refresh_token()));
        // The retry still sees the original token, not a mutated one.
        mock.expect_refresh()
            .withf(|held| held.access_token == "AT1" && held.refresh_token == "RT1")
            .times(1)
            .returning(|_| Ok(token("AT2", "RT2", HOUR)));

        let source = TokenSource::new(Arc::new(mock), token("AT1", "RT1", Duration::ZERO));

        let err = source.token().await.unwrap_err();
        assert_eq!(err.kind(), TokenErrorKind::NoRefreshToken);

        let got = source.token().await.unwrap();
        assert_eq!(got.access_token, "AT2");
    }

    #[derive(Debug)]
    struct CountingExchanger {
        calls: std::sync::Mutex<i32>,
    }

    #[async_trait::async_trait]
    impl TokenExchanger for CountingExchanger {
        async fn exchange(
            &self,
            _params: std::collections::HashMap<String, String>,
        ) -> Result<Token> {
            unimplemented!("herd test never exchanges")
        }

        async fn refresh(&self, _token: Token) -> Result<Token> {
            // Give the waiters in a thundering herd time to pile up.
            tokio::time::sleep(Duration::from_millis(50)).await;
            *self.calls.lock().unwrap() += 1;
            Ok(token("AT2", "RT2", HOUR))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_callers_share_one_refresh() {
        let exchanger = Arc::new(CountingExchanger {
            calls: std::sync::Mutex::new(0),
        });
        let source = TokenSource::new(exchanger.clone(), token("AT1", "RT1", Duration::ZERO));

        let tasks = (0..100)
            .map(|_| {
                let source = source.clone();
                tokio::spawn(async move { source.token().await })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            let got = task.await.unwrap().unwrap();
            assert_eq!(got.access_token, "AT2");
        }

        // The first caller refreshes; everyone queued behind the guard then
        // observes a valid token and returns it without another call.
        assert_eq!(*exchanger.calls.lock().unwrap(), 1);
    }
}
