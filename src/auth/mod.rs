//! Session token minting
//!
//! Custom tokens are RS256 JWTs signed with the service account key; the
//! wallet address becomes the `uid` claim.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::errors::{FundsuError, FundsuResult, ValidationError};
use crate::logger::{self, LogTag};
use crate::utils::{format_address_short, unix_now};

/// Audience expected by the identity service for custom tokens
pub const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// Upper bound the identity service accepts for `exp - iat`
pub const MAX_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub uid: String,
}

pub struct TokenIssuer {
    client_email: String,
    key: Option<EncodingKey>,
    ttl_secs: u64,
}

impl TokenIssuer {
    /// Issuer from the `auth` section
    ///
    /// Missing credentials leave the issuer unconfigured; every `issue` call
    /// then fails. Credentials that are present but unreadable are an error.
    pub fn from_config(config: &AuthConfig) -> FundsuResult<Self> {
        let pem = match (&config.private_key_inline, config.private_key_path.as_str()) {
            (Some(inline), _) if !inline.trim().is_empty() => Some(inline.clone()),
            (_, "") => None,
            (_, path) => Some(std::fs::read_to_string(path).map_err(|e| {
                FundsuError::configuration_error(format!("cannot read private key {}: {}", path, e))
            })?),
        };

        let key = match pem {
            Some(pem) => Some(EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                FundsuError::configuration_error(format!("invalid service account key: {}", e))
            })?),
            None => {
                logger::warning(
                    LogTag::Auth,
                    "No service account key configured, session tokens are disabled",
                );
                None
            }
        };

        if key.is_some() && config.client_email.is_empty() {
            return Err(FundsuError::configuration_error(
                "auth.client_email is required when a private key is set",
            ));
        }

        Ok(Self {
            client_email: config.client_email.clone(),
            key,
            ttl_secs: config.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn claims(&self, uid: &str, now: i64) -> CustomTokenClaims {
        CustomTokenClaims {
            iss: self.client_email.clone(),
            sub: self.client_email.clone(),
            aud: CUSTOM_TOKEN_AUDIENCE.to_string(),
            iat: now,
            exp: now + self.ttl_secs as i64,
            uid: uid.to_string(),
        }
    }

    /// Signed custom token for `wallet_address`
    pub fn issue(&self, wallet_address: &str) -> FundsuResult<String> {
        if wallet_address.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "walletAddress".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| FundsuError::configuration_error("session token key is not configured"))?;

        let claims = self.claims(wallet_address, unix_now());
        let token = encode(&Header::new(Algorithm::RS256), &claims, key)
            .map_err(|e| FundsuError::configuration_error(format!("failed to sign token: {}", e)))?;

        logger::debug(
            LogTag::Auth,
            &format!("Issued session token for {}", format_address_short(wallet_address)),
        );
        Ok(token)
    }
}
