use log::error;
use rand::RngCore;
use ring::hmac::{self, HMAC_SHA256, Key};
use std::path::Path;
use tokio::fs::{create_dir_all, read, write};

/// The file the server secret is persisted to between runs
const SECRET_PATH: &str = "data/secret.bin";
/// Length in bytes of the server secret
const SECRET_LENGTH: usize = 64;

/// HMAC-SHA256 key used for signing and verifying tokens
pub struct SigningKey(Key);

impl SigningKey {
    /// Obtains the process signing key. Loads the persisted secret when
    /// one exists, otherwise generates a new secret and stores it so
    /// tokens stay valid across restarts
    pub async fn global() -> SigningKey {
        let path = Path::new(SECRET_PATH);

        if path.exists()
            && let Ok(secret) = read(path).await
            && secret.len() == SECRET_LENGTH
        {
            return SigningKey::from_secret(&secret);
        }

        let (key, secret) = SigningKey::generate();

        if let Some(parent) = path.parent()
            && let Err(err) = create_dir_all(parent).await
        {
            error!("Failed to create directory for signing key: {:?}", err);
            return key;
        }

        if let Err(err) = write(path, secret).await {
            error!("Failed to persist signing key: {:?}", err);
        }

        key
    }

    /// Generates a new random signing key, returning both the key and
    /// the secret it was derived from
    pub fn generate() -> (SigningKey, [u8; SECRET_LENGTH]) {
        let mut secret = [0u8; SECRET_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        (SigningKey::from_secret(&secret), secret)
    }

    pub fn from_secret(secret: &[u8]) -> SigningKey {
        SigningKey(Key::new(HMAC_SHA256, secret))
    }

    /// Computes the HMAC signature for the provided message
    pub fn sign(&self, data: &[u8]) -> hmac::Tag {
        hmac::sign(&self.0, data)
    }

    /// Verifies an HMAC signature over the provided message
    pub fn verify(&self, data: &[u8], sig: &[u8]) -> bool {
        hmac::verify(&self.0, data, sig).is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::SigningKey;

    #[test]
    fn test_sign_verify() {
        let (key, _) = SigningKey::generate();
        let sig = key.sign(b"message");
        assert!(key.verify(b"message", sig.as_ref()));
        assert!(!key.verify(b"other message", sig.as_ref()));
    }

    /// Signatures from one key must not verify under another
    #[test]
    fn test_different_keys() {
        let (a, _) = SigningKey::generate();
        let (b, _) = SigningKey::generate();
        let sig = a.sign(b"message");
        assert!(!b.verify(b"message", sig.as_ref()));
    }
}
