//! API key signing
//!
//! Supabase API keys are HS256 JWTs signed with the stack's JWT secret. The
//! claims are fixed so that regenerating a key for the same secret yields the
//! same token.

use crate::error::{HservError, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const ISSUER: &str = "supabase";
pub const ISSUED_AT: i64 = 1_689_717_600;
pub const EXPIRES_AT: i64 = 1_847_570_400;

/// Role encoded in an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRole {
    Anon,
    ServiceRole,
}

impl ApiRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anon => "anon",
            Self::ServiceRole => "service_role",
        }
    }
}

impl fmt::Display for ApiRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiRole {
    type Err = HservError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anon" => Ok(Self::Anon),
            "service_role" | "service" => Ok(Self::ServiceRole),
            other => Err(HservError::invalid_argument(format!(
                "Unknown API role '{other}', expected 'anon' or 'service_role'"
            ))),
        }
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    role: &'a str,
    iss: &'a str,
    iat: i64,
    exp: i64,
}

/// Sign an API key for `role` with the stack's JWT secret
pub fn generate_api_key(role: ApiRole, secret: &str) -> Result<String> {
    let claims = Claims {
        role: role.as_str(),
        iss: ISSUER,
        iat: ISSUED_AT,
        exp: EXPIRES_AT,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| HservError::token(e.to_string()))
}
