//! Service for issuing and verifying the signed session tokens
//! carried by authenticated requests

use crate::database::entity::users::UserId;
use crate::http::models::HttpError;
use crate::utils::signing::SigningKey;
use base64ct::{Base64UrlUnpadded, Encoding};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Service for creating and verifying session tokens. Stateless, the
/// only state is the HMAC key the signatures are computed with
pub struct Tokens {
    /// HMAC key used for computing signatures
    key: SigningKey,
}

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: String,
    /// Absolute expiry as a unix timestamp in seconds
    pub exp: u64,
}

impl Tokens {
    /// Expiry time for tokens
    const EXPIRY_TIME: Duration = Duration::from_secs(60 * 60 * 24 * 30 /* 30 Days */);

    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn create_token(&self, user_id: UserId, username: &str) -> String {
        // Compute expiry timestamp
        let exp = SystemTime::now()
            .checked_add(Self::EXPIRY_TIME)
            .expect("Expiry timestamp too far into the future")
            .duration_since(UNIX_EPOCH)
            .expect("Clock went backwards")
            .as_secs();

        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            exp,
        };
        let data = serde_json::to_vec(&claims).expect("Token claims should always serialize");

        // Encode the message
        let msg = Base64UrlUnpadded::encode_string(&data);

        // Create a signature from the raw message bytes
        let sig = self.key.sign(&data);
        let sig = Base64UrlUnpadded::encode_string(sig.as_ref());

        // Join the message and signature to create the token
        [msg, sig].join(".")
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        // Split the token parts
        let (msg_raw, sig_raw) = match token.split_once('.') {
            Some(value) => value,
            None => return Err(VerifyError::Invalid),
        };

        // Decode the claims message
        let msg = Base64UrlUnpadded::decode_vec(msg_raw).map_err(|_| VerifyError::Invalid)?;

        // Decode 32byte signature (SHA256)
        let mut sig_buffer = [0u8; 32];
        let sig =
            Base64UrlUnpadded::decode(sig_raw, &mut sig_buffer).map_err(|_| VerifyError::Invalid)?;

        // Verify the signature before trusting the claims
        if !self.key.verify(&msg, sig) {
            return Err(VerifyError::Invalid);
        }

        let claims: TokenClaims = serde_json::from_slice(&msg).map_err(|_| VerifyError::Invalid)?;

        // Ensure the timestamp is not expired
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Clock went backwards")
            .as_secs();

        if claims.exp < now {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }
}

/// Errors that can occur while verifying a token
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token is expired
    #[error("Authorization token is expired")]
    Expired,
    /// The token is invalid
    #[error("Invalid authorization token")]
    Invalid,
}

impl HttpError for VerifyError {
    fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

#[cfg(test)]
mod test {
    use base64ct::{Base64UrlUnpadded, Encoding};

    use super::{TokenClaims, Tokens, VerifyError};
    use crate::utils::signing::SigningKey;

    /// Tests that tokens can be created and verified correctly
    #[test]
    fn test_token_round_trip() {
        let (key, _) = SigningKey::generate();
        let tokens = Tokens::new(key);

        let token = tokens.create_token(32, "ann");
        let claims = tokens.verify_token(&token).unwrap();

        assert_eq!(claims.user_id, 32);
        assert_eq!(claims.username, "ann");
    }

    /// Tampering with the claims must invalidate the signature
    #[test]
    fn test_tampered_token() {
        let (key, _) = SigningKey::generate();
        let tokens = Tokens::new(key);

        let token = tokens.create_token(32, "ann");
        let (_, sig) = token.split_once('.').unwrap();

        let forged = serde_json::to_vec(&TokenClaims {
            user_id: 33,
            username: "ann".to_string(),
            exp: u64::MAX,
        })
        .unwrap();
        let forged = [Base64UrlUnpadded::encode_string(&forged), sig.to_string()].join(".");

        assert!(matches!(
            tokens.verify_token(&forged),
            Err(VerifyError::Invalid)
        ));
    }

    /// Tokens signed by a different key must not verify
    #[test]
    fn test_wrong_key() {
        let (key, _) = SigningKey::generate();
        let (other_key, _) = SigningKey::generate();
        let token = Tokens::new(key).create_token(32, "ann");

        assert!(matches!(
            Tokens::new(other_key).verify_token(&token),
            Err(VerifyError::Invalid)
        ));
    }

    /// Correctly signed but expired claims must be rejected
    #[test]
    fn test_expired_token() {
        let (key, _) = SigningKey::generate();
        let tokens = Tokens::new(key);

        let data = serde_json::to_vec(&TokenClaims {
            user_id: 32,
            username: "ann".to_string(),
            exp: 1,
        })
        .unwrap();
        let msg = Base64UrlUnpadded::encode_string(&data);
        let sig = tokens.key.sign(&data);
        let sig = Base64UrlUnpadded::encode_string(sig.as_ref());
        let token = [msg, sig].join(".");

        assert!(matches!(
            tokens.verify_token(&token),
            Err(VerifyError::Expired)
        ));
    }

    #[test]
    fn test_garbage_token() {
        let (key, _) = SigningKey::generate();
        let tokens = Tokens::new(key);

        assert!(matches!(
            tokens.verify_token("no-separator"),
            Err(VerifyError::Invalid)
        ));
        assert!(matches!(
            tokens.verify_token("not!base64.also!not"),
            Err(VerifyError::Invalid)
        ));
    }
}
