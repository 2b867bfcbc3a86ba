pub mod password;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SecurityConfig;

/// Distinguishes access tokens from refresh tokens so neither can stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub typ: TokenKind,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identity encoded into every token
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: i64,
    pub email: &'a str,
    pub username: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Token expired")]
    Expired,
    #[error("Wrong token type: expected {expected:?}")]
    WrongKind { expected: TokenKind },
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies HS256 tokens pinned to one issuer and audience
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue a fresh access/refresh pair for the subject
    pub fn issue(&self, subject: &TokenSubject<'_>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(&self.claims(subject, TokenKind::Access))?,
            refresh_token: self.sign(&self.claims(subject, TokenKind::Refresh))?,
        })
    }

    fn claims(&self, subject: &TokenSubject<'_>, typ: TokenKind) -> Claims {
        let now = Utc::now().timestamp();
        let ttl = match typ {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        Claims {
            user_id: subject.user_id,
            email: subject.email.to_string(),
            username: subject.username.to_string(),
            typ,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        }
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify signature, expiry, issuer, audience and token kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.typ != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}
