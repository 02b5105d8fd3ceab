//! Signed session tokens.
//!
//! Tokens are self-contained JWTs carrying the username as subject plus an
//! expiry. Validation is purely computational: signature verification and
//! an expiry check, never a store lookup, so it cannot block on I/O.

use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{TokenError, ValidationError},
};

/// Claims embedded in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - the username.
    pub sub: String,
    /// Issued at (UTC seconds).
    pub iat: i64,
    /// Expiration time (UTC seconds).
    pub exp: i64,
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Signing algorithm and key material.
#[derive(Debug, Clone)]
pub enum TokenAlgorithm {
    /// HMAC with SHA-256; one shared secret signs and verifies.
    Hs256 {
        secret_key: Vec<u8>,
    },
    /// RSA with SHA-256; PEM-encoded key pair.
    Rs256 {
        private_key: Vec<u8>,
        public_key: Vec<u8>,
    },
}

/// Process-wide token configuration. The signing key is configuration, not
/// user data.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub algorithm: TokenAlgorithm,
    pub issuer: Option<String>,
    /// How long an issued token stays valid.
    pub lifetime: Duration,
}

impl TokenConfig {
    pub fn new_hs256(secret_key: Vec<u8>) -> Self {
        Self {
            algorithm: TokenAlgorithm::Hs256 { secret_key },
            issuer: None,
            lifetime: Duration::hours(24),
        }
    }

    pub fn new_rs256(private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            algorithm: TokenAlgorithm::Rs256 {
                private_key,
                public_key,
            },
            issuer: None,
            lifetime: Duration::hours(24),
        }
    }

    /// Load an RS256 configuration from PEM key files.
    pub fn from_rs256_pem_files(
        private_key_path: impl AsRef<Path>,
        public_key_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        use std::fs::read;

        let private_key = read(private_key_path).map_err(|e| {
            ValidationError::MissingField(format!("Failed to read private key file: {e}"))
        })?;

        let public_key = read(public_key_path).map_err(|e| {
            ValidationError::MissingField(format!("Failed to read public key file: {e}"))
        })?;

        Ok(Self::new_rs256(private_key, public_key))
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    fn jwt_algorithm(&self) -> Algorithm {
        match &self.algorithm {
            TokenAlgorithm::Hs256 { .. } => Algorithm::HS256,
            TokenAlgorithm::Rs256 { .. } => Algorithm::RS256,
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, Error> {
        match &self.algorithm {
            TokenAlgorithm::Hs256 { secret_key } => Ok(EncodingKey::from_secret(secret_key)),
            TokenAlgorithm::Rs256 { private_key, .. } => EncodingKey::from_rsa_pem(private_key)
                .map_err(|e| {
                    ValidationError::MissingField(format!("Invalid RSA private key: {e}")).into()
                }),
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, Error> {
        match &self.algorithm {
            TokenAlgorithm::Hs256 { secret_key } => Ok(DecodingKey::from_secret(secret_key)),
            TokenAlgorithm::Rs256 { public_key, .. } => DecodingKey::from_rsa_pem(public_key)
                .map_err(|e| {
                    ValidationError::MissingField(format!("Invalid RSA public key: {e}")).into()
                }),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.jwt_algorithm());
        // Expiry boundaries are exact; a token is rejected at its expiry
        // instant, not some leeway later.
        validation.leeway = 0;
        validation
    }
}

/// Issues and validates signed session tokens.
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue a token for `subject` using the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<String, Error> {
        self.issue_with_lifetime(subject, self.config.lifetime)
    }

    /// Issue a token for `subject` with a custom lifetime.
    pub fn issue_with_lifetime(&self, subject: &str, lifetime: Duration) -> Result<String, Error> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: self.config.issuer.clone(),
        };

        let header = Header::new(self.config.jwt_algorithm());
        let token = encode(&header, &claims, &self.config.encoding_key()?)
            .map_err(|e| TokenError::Invalid(format!("Failed to encode token: {e}")))?;

        Ok(token)
    }

    /// Verify a token and return its subject.
    pub fn validate(&self, token: &str) -> Result<String, Error> {
        let decoding_key = self.config.decoding_key()?;
        let validation = self.config.validation();

        let token_data =
            decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => Error::Token(TokenError::Expired),
                    _ => Error::Token(TokenError::Invalid(format!("Token validation failed: {e}"))),
                }
            })?;

        // The library rejects exp strictly in the past; a token presented at
        // exactly its expiry instant is expired too.
        if Utc::now().timestamp() >= token_data.claims.exp {
            return Err(Error::Token(TokenError::Expired));
        }

        Ok(token_data.claims.sub)
    }
}
