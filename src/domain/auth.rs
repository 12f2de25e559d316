use crate::domain::user::{Role, UserSummary};
use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. No role: a refreshed access token takes
/// the role from the live account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub trait TokenClaims: Serialize + DeserializeOwned {
    fn expires_at(&self) -> i64;

    /// Signs the claims with HS256.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    fn encode(&self, secret: &str) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), self, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|_| AppError::Internal)
    }

    /// Verifies the signature and checks expiry against `now` (unix seconds).
    ///
    /// # Errors
    /// Returns `AppError::InvalidToken` for malformed, mis-signed or expired tokens.
    fn decode(token: &str, secret: &str, now: i64) -> Result<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below, not the system clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Self>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|_| AppError::InvalidToken)?;

        if now >= data.claims.expires_at() {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }
}

impl TokenClaims for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenClaims for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// The authenticated caller, as established from an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserSummary,
}

pub struct Password;

impl Password {
    /// Produces a salted argon2 PHC string.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if hashing fails.
    #[tracing::instrument(skip(password), level = "debug")]
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt).map_err(|_| AppError::Internal)?.to_string();
        Ok(password_hash)
    }

    /// Constant-time comparison of `password` against a stored hash.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the stored hash is not a valid PHC string.
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::Internal)?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000;

    fn access(exp: i64) -> AccessClaims {
        AccessClaims { user_id: Uuid::new_v4(), role: Role::Pharmacist, iat: NOW, exp }
    }

    #[test]
    fn test_access_claims_roundtrip() {
        let claims = access(NOW + 3600);
        let token = claims.encode("access").unwrap();
        let decoded = AccessClaims::decode(&token, "access", NOW).unwrap();
        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_claims_invalid_secret() {
        let token = access(NOW + 3600).encode("secret1").unwrap();
        let result = AccessClaims::decode(&token, "secret2", NOW);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let token = access(NOW + 10).encode("access").unwrap();
        assert!(AccessClaims::decode(&token, "access", NOW + 9).is_ok());
        assert!(matches!(AccessClaims::decode(&token, "access", NOW + 10), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_refresh_token_carries_no_role() {
        let claims = RefreshClaims { user_id: Uuid::new_v4(), iat: NOW, exp: NOW + 60 };
        let token = claims.encode("refresh").unwrap();

        // Same secret, but the payload shape is not an access token.
        assert!(matches!(AccessClaims::decode(&token, "refresh", NOW), Err(AppError::InvalidToken)));
        assert_eq!(RefreshClaims::decode(&token, "refresh", NOW).unwrap(), claims);
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(AccessClaims::decode("not.a.jwt", "access", NOW), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_password_hashing() {
        let password = "password12345";
        let hash = Password::hash(password).unwrap();

        assert!(Password::verify(password, &hash).unwrap());
        assert!(!Password::verify("wrong_password", &hash).unwrap());
        assert_ne!(hash, Password::hash(password).unwrap());
    }
}
