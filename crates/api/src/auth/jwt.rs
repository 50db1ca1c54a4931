//! Access-token validation.
//!
//! Tokens are HS256 JWTs minted by the identity service. The role travels
//! as a typed claim, so a token naming an unknown role fails to decode
//! rather than reaching a handler. [`generate_access_token`] mints the same
//! shape for the identity service and for tests.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pfe_core::roles::Role;
use pfe_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds of clock skew tolerated on `exp`.
const LEEWAY_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Internal user id.
    pub sub: DbId,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret with the identity service.
    pub secret: String,
    /// Lifetime of tokens minted by [`generate_access_token`].
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Load from `JWT_SECRET` (required) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default `15`).
    ///
    /// # Panics
    ///
    /// Panics on a missing or empty secret, or a non-numeric expiry.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => 15,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.leeway = LEEWAY_SECS;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

pub fn generate_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role,
        exp: iat + config.access_token_expiry_mins * 60,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry, returning the decoded claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &JwtConfig::validation(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
        }
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn minted_token_round_trips_role() {
        let cfg = config("pfe-secret");
        let token = generate_access_token(42, Role::Teacher, &cfg).unwrap();

        let claims = validate_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expired_token_is_refused() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({
                "sub": 1, "role": "student", "exp": now - 300, "iat": now - 1200, "jti": "x"
            }),
            "pfe-secret",
        );
        assert!(validate_token(&token, &config("pfe-secret")).is_err());
    }

    #[test]
    fn unknown_role_is_refused() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({
                "sub": 1, "role": "janitor", "exp": now + 300, "iat": now, "jti": "x"
            }),
            "pfe-secret",
        );
        assert!(validate_token(&token, &config("pfe-secret")).is_err());
    }

    #[test]
    fn foreign_secret_is_refused() {
        let token = generate_access_token(1, Role::Admin, &config("alpha")).unwrap();
        assert!(validate_token(&token, &config("bravo")).is_err());
    }
}
