//! JWT service for session token generation and validation
//!
//! Tokens are HS256-signed with a shared secret and carry the user's id,
//! first name and email. They are stateless: nothing is stored server-side,
//! so a token stays valid until it expires.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Default session lifetime: 2 hours
pub const DEFAULT_TOKEN_EXPIRY: u64 = 2 * 60 * 60;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Signing secret (required, non-empty)
    /// - `JWT_EXPIRY_SECONDS`: Token lifetime in seconds (default: 7200)
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let token_expiry = std::env::var("JWT_EXPIRY_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("System clock is before the Unix epoch")]
    Clock,
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID
    pub id: Uuid,
    pub firstname: String,
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Identity decoded from a verified token, handed to protected handlers
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub firstname: String,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.id,
            firstname: claims.firstname,
            email: claims.email,
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Issue a session token for the given identity
    pub fn issue(&self, id: Uuid, firstname: &str, email: &str) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::Clock)?
            .as_secs();

        let claims = Claims {
            id,
            firstname: firstname.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.token_expiry,
        };

        self.sign(&claims)
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Invalid)?;
        Ok(token_data.claims)
    }

    /// Token lifetime in seconds
    pub fn token_expiry(&self) -> u64 {
        self.token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        })
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let jwt = service("secret");
        let id = Uuid::new_v4();

        let token = jwt.issue(id, "Amy", "amy@x.com").unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.firstname, "Amy");
        assert_eq!(claims.email, "amy@x.com");
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_EXPIRY);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service("secret");
        let issued = now() - 3 * 60 * 60;
        let token = jwt
            .sign(&Claims {
                id: Uuid::new_v4(),
                firstname: "Amy".to_string(),
                email: "amy@x.com".to_string(),
                iat: issued,
                exp: issued + DEFAULT_TOKEN_EXPIRY,
            })
            .unwrap();

        assert!(matches!(
            jwt.validate_token(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = service("other").issue(Uuid::new_v4(), "Amy", "a@x.com").unwrap();
        assert!(service("secret").validate_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service("secret").validate_token("not-a-token").is_err());
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", "s3cret");
            std::env::remove_var("JWT_EXPIRY_SECONDS");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.token_expiry, 7200);

        unsafe {
            std::env::set_var("JWT_SECRET", "");
        }
        assert!(JwtConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }
}
