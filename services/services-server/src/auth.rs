// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! HTTP Basic authentication against the configured users

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use services_api::Privilege;
use subtle::ConstantTimeEq;

use crate::config::{UserRole, UserSpec};
use crate::error::ServiceError;

struct Credential {
    password: SecretString,
    role: UserRole,
}

/// Checks request credentials against the configured users.
pub struct Authenticator {
    users: HashMap<String, Credential>,
}

impl Authenticator {
    pub fn new(users: Vec<UserSpec>) -> Self {
        let users = users
            .into_iter()
            .map(|u| {
                (
                    u.name,
                    Credential {
                        password: u.password,
                        role: u.role,
                    },
                )
            })
            .collect();
        Self { users }
    }

    /// Authorize a request for `privilege`.
    ///
    /// Returns the authenticated user name, or `None` for operations that
    /// need no credentials.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        privilege: Privilege,
    ) -> Result<Option<String>, ServiceError> {
        if privilege == Privilege::None {
            return Ok(None);
        }

        let (user, password) = basic_credentials(headers)?;

        let credential = self
            .users
            .get(&user)
            .filter(|c| passwords_match(&c.password, &password))
            .ok_or_else(|| ServiceError::Authorization("Invalid credentials".to_string()))?;

        if privilege == Privilege::Write && credential.role != UserRole::Admin {
            return Err(ServiceError::Authorization(format!(
                "User '{}' is not allowed to run commands",
                user
            )));
        }

        Ok(Some(user))
    }
}

/// Compare without short-circuiting on the first differing byte
fn passwords_match(expected: &SecretString, given: &str) -> bool {
    expected
        .expose_secret()
        .as_bytes()
        .ct_eq(given.as_bytes())
        .into()
}

/// Extract `(user, password)` from an `Authorization: Basic ...` header
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ServiceError> {
    let missing = || ServiceError::Authorization("Missing credentials".to_string());
    let malformed = || ServiceError::Authorization("Malformed credentials".to_string());

    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| malformed())?;

    let (scheme, encoded) = value.trim().split_once(' ').ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(malformed());
    }

    let decoded = STANDARD.decode(encoded.trim()).map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;
    let (user, password) = decoded.split_once(':').ok_or_else(malformed)?;

    Ok((user.to_string(), password.to_string()))
}
