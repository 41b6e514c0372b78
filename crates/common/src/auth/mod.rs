//! Authentication and authorization utilities
//!
//! Provides:
//! - Staff roles and what each may do
//! - JWT token generation and validation
//! - Caller context extraction for axum handlers

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Who is calling. Visitors without a token are `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    CatalogManager,
    ChiefRestorer,
    Public,
}

/// Guarded groups of operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Internal listings and reports; any staff role
    ViewCatalog,
    /// Artworks, restorers and lookup tables
    EditCatalog,
    ManageRestorations,
    /// Loans, exhibitions, partner museums and loan requests
    ManageLoans,
    ViewValuation,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::CatalogManager => "catalog_manager",
            Role::ChiefRestorer => "chief_restorer",
            Role::Public => "public",
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Director, _) => true,
            (Role::Public, _) => false,
            (_, Capability::ViewCatalog) => true,
            (Role::CatalogManager, Capability::EditCatalog | Capability::ViewValuation) => true,
            (Role::ChiefRestorer, Capability::ManageRestorations) => true,
            _ => false,
        }
    }

    pub fn can_see_valuation(&self) -> bool {
        self.allows(Capability::ViewValuation)
    }

    pub fn is_staff(&self) -> bool {
        *self != Role::Public
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "director" => Ok(Role::Director),
            "catalog_manager" => Ok(Role::CatalogManager),
            "chief_restorer" => Ok(Role::ChiefRestorer),
            "public" => Ok(Role::Public),
            _ => Err(AppError::InvalidFormat {
                message: format!("unknown role '{}'", s),
            }),
        }
    }
}

/// Extracted caller context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: Role,

    /// Subject of the token, if any
    pub subject: Option<String>,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    pub fn public(request_id: String) -> Self {
        Self {
            role: Role::Public,
            subject: None,
            request_id,
        }
    }

    /// Require a capability, returning error if the role lacks it
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.role.allows(capability) {
            Ok(())
        } else if self.role.is_staff() {
            Err(AppError::Forbidden {
                message: format!("role {} may not perform this operation", self.role),
            })
        } else {
            Err(AppError::Unauthorized {
                message: "a staff token is required".to_string(),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (staff member)
    pub sub: String,

    pub role: Role,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, subject: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: subject.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}

/// Extract the bearer token from an Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Axum extractor for AuthContext.
///
/// A missing Authorization header yields a public context; a present but
/// unusable token is rejected.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let Some(auth_header) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(AuthContext::public(request_id));
        };

        let token = extract_bearer(auth_header).ok_or(AppError::InvalidToken)?;
        let jwt = Arc::<JwtManager>::from_ref(state);
        let claims = jwt.validate_token(token)?;

        Ok(AuthContext {
            role: claims.role,
            subject: Some(claims.sub),
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let token = manager.generate_token("curator@museo.org", Role::CatalogManager).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "curator@museo.org");
        assert_eq!(claims.role, Role::CatalogManager);
    }

    #[test]
    fn test_foreign_token_is_invalid() {
        let ours = JwtManager::new("ours", 3600);
        let theirs = JwtManager::new("theirs", 3600);
        let token = theirs.generate_token("intruder", Role::Director).unwrap();

        assert!(matches!(ours.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_capability_matrix() {
        assert!(Role::Director.allows(Capability::ManageLoans));
        assert!(Role::CatalogManager.allows(Capability::EditCatalog));
        assert!(!Role::CatalogManager.allows(Capability::ManageRestorations));
        assert!(Role::ChiefRestorer.allows(Capability::ManageRestorations));
        assert!(!Role::ChiefRestorer.can_see_valuation());
        assert!(!Role::Public.can_see_valuation());
        assert!(Role::ChiefRestorer.allows(Capability::ViewCatalog));
        assert!(!Role::Public.allows(Capability::ViewCatalog));
    }

    #[test]
    fn test_public_callers_are_unauthorized_and_staff_forbidden() {
        let public = AuthContext::public("req-1".into());
        assert!(matches!(
            public.require(Capability::EditCatalog),
            Err(AppError::Unauthorized { .. })
        ));

        let restorer = AuthContext {
            role: Role::ChiefRestorer,
            subject: Some("jefa".into()),
            request_id: "req-2".into(),
        };
        assert!(restorer.require(Capability::ManageRestorations).is_ok());
        assert!(matches!(
            restorer.require(Capability::ManageLoans),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_role_parses() {
        assert_eq!("chief_restorer".parse::<Role>().unwrap(), Role::ChiefRestorer);
        assert!("curator".parse::<Role>().is_err());
    }
}
