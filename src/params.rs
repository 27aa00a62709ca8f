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

//! Helpers for the string parameter sets passed to an exchange.
//!
//! Exchange parameters travel as plain `HashMap<String, String>` values;
//! form encoding itself is handled by `reqwest` when the request is built.

use crate::Result;
use crate::errors::TokenError;
use std::collections::HashMap;

/// Verifies that every key in `keys` is present and non-empty.
///
/// Fails with [TokenErrorKind::MissingParameter][crate::errors::TokenErrorKind::MissingParameter]
/// naming the first absent key. Providers call this before building any
/// request, so a bad parameter set never reaches the network.
pub fn require(params: &HashMap<String, String>, keys: &[&str]) -> Result<()> {
    for key in keys {
        match params.get(*key) {
            Some(value) if !value.is_empty() => {}
            _ => return Err(TokenError::missing_parameter(key)),
        }
    }
    Ok(())
}

/// Folds `defaults` into `params` without overwriting explicitly set keys.
pub fn merge(params: &mut HashMap<String, String>, defaults: &HashMap<String, String>) {
    for (key, value) in defaults {
        params
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::TokenErrorKind;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn require_all_present() {
        let params = map(&[("code", "abc"), ("code_verifier", "xyz")]);
        assert!(require(&params, &["code", "code_verifier"]).is_ok());
    }

    #[test]
    fn require_missing_key() {
        let params = map(&[("code", "abc")]);
        let err = require(&params, &["code", "code_verifier"]).unwrap_err();
        assert_eq!(err.kind(), TokenErrorKind::MissingParameter);
        assert!(format!("{err}").contains("code_verifier"), "{err}");
    }

    #[test]
    fn require_empty_value() {
        let params = map(&[("code", "")]);
        let err = require(&params, &["code"]).unwrap_err();
        assert_eq!(err.kind(), TokenErrorKind::MissingParameter);
    }

    #[test]
    fn merge_keeps_explicit_keys() {
        let mut params = map(&[("scope", "explicit")]);
        let defaults = map(&[("scope", "default"), ("client_id", "id-123")]);
        merge(&mut params, &defaults);
        assert_eq!(params.get("scope").unwrap(), "explicit");
        assert_eq!(params.get("client_id").unwrap(), "id-123");
    }

    #[test]
    fn merge_into_empty() {
        let mut params = HashMap::new();
        let defaults = map(&[("client_id", "id-123")]);
        merge(&mut params, &defaults);
        assert_eq!(params, defaults);
    }
}
