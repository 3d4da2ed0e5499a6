use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::models::AuthPayload;

/// How new passwords are hashed.
///
/// `Bcrypt` is salted and slow. `Sha512` reproduces the legacy credential
/// format (unsalted hex digest) and exists for compatibility with accounts
/// created by earlier deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Bcrypt,
    Sha512,
}

impl FromStr for PasswordScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(Self::Bcrypt),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("unknown password scheme '{other}'")),
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bcrypt => f.write_str("bcrypt"),
            Self::Sha512 => f.write_str("sha512"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    scheme: PasswordScheme,
    bcrypt_cost: u32,
}

impl PasswordHasher {
    pub fn new(scheme: PasswordScheme, bcrypt_cost: u32) -> Self {
        Self { scheme, bcrypt_cost }
    }

    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }

    pub fn hash_password(&self, password: &str) -> Result<String, StoreError> {
        match self.scheme {
            PasswordScheme::Bcrypt => {
                if password.len() > BCRYPT_MAX_PASSWORD_BYTES {
                    return Err(StoreError::PasswordTooLong(BCRYPT_MAX_PASSWORD_BYTES));
                }
                Ok(hash(password, self.bcrypt_cost)?)
            }
            PasswordScheme::Sha512 => Ok(sha512_hex(password)),
        }
    }

    /// Checks `password` against a stored hash of either format, whatever the
    /// current scheme is.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, StoreError> {
        if stored.starts_with("$2") {
            // bcrypt reads only 72 bytes and longer passwords are refused
            // by hash_password, so they cannot match.
            if password.len() > BCRYPT_MAX_PASSWORD_BYTES {
                return Ok(false);
            }
            return Ok(verify(password, stored)?);
        }
        if stored.len() != SHA512_HEX_LEN || !stored.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::MalformedHash);
        }
        Ok(sha512_hex(password).as_bytes() == stored.as_bytes())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordScheme::Bcrypt, bcrypt::DEFAULT_COST)
    }
}

const SHA512_HEX_LEN: usize = 128;
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

fn sha512_hex(password: &str) -> String {
    hex::encode(Sha512::digest(password.as_bytes()))
}

/// Issues and checks signed session tokens (HS256 JWT, `sub` = username).
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn create_jwt(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let expiration = Utc::now().timestamp().max(0) as usize + self.ttl_secs as usize;

        let claims = AuthPayload {
            sub: username.to_owned(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn validate_jwt(&self, token: &str) -> Result<AuthPayload, jsonwebtoken::errors::Error> {
        let token_data = decode::<AuthPayload>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_matches_legacy_format() {
        let hasher = PasswordHasher::new(PasswordScheme::Sha512, 4);
        let stored = hasher.hash_password("secret1").unwrap();
        assert_eq!(stored.len(), 128);
        assert!(stored.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert!(hasher.verify_password("secret1", &stored).unwrap());
        assert!(!hasher.verify_password("secret2", &stored).unwrap());
    }

    #[test]
    fn test_bcrypt_is_salted() {
        let hasher = PasswordHasher::new(PasswordScheme::Bcrypt, 4);
        let a = hasher.hash_password("secret1").unwrap();
        let b = hasher.hash_password("secret1").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify_password("secret1", &a).unwrap());
        assert!(!hasher.verify_password("wrong", &b).unwrap());
    }

    #[test]
    fn test_bcrypt_rejects_passwords_past_72_bytes() {
        let hasher = PasswordHasher::new(PasswordScheme::Bcrypt, 4);
        let exact = "a".repeat(72);
        let stored = hasher.hash_password(&exact).unwrap();

        assert!(hasher.verify_password(&exact, &stored).unwrap());
        assert!(!hasher
            .verify_password(&format!("{exact}anything"), &stored)
            .unwrap());
        assert!(matches!(
            hasher.hash_password(&format!("{exact}x")),
            Err(StoreError::PasswordTooLong(72))
        ));

        // the legacy digest covers the whole password
        let legacy = PasswordHasher::new(PasswordScheme::Sha512, 4);
        assert!(legacy.hash_password(&format!("{exact}x")).is_ok());
    }

    #[test]
    fn test_verify_accepts_either_format() {
        let legacy = PasswordHasher::new(PasswordScheme::Sha512, 4)
            .hash_password("hunter22")
            .unwrap();
        let bcrypt_hasher = PasswordHasher::new(PasswordScheme::Bcrypt, 4);
        assert!(bcrypt_hasher.verify_password("hunter22", &legacy).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let hasher = PasswordHasher::new(PasswordScheme::Sha512, 4);
        assert!(matches!(
            hasher.verify_password("pw", "not-a-hash"),
            Err(StoreError::MalformedHash)
        ));
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("BCRYPT".parse::<PasswordScheme>(), Ok(PasswordScheme::Bcrypt));
        assert_eq!("sha512".parse::<PasswordScheme>(), Ok(PasswordScheme::Sha512));
        assert!("md5".parse::<PasswordScheme>().is_err());
    }

    #[test]
    fn test_jwt_round_trip() {
        let keys = SessionKeys::new(b"test-secret", 60);
        let token = keys.create_jwt("alice").unwrap();
        let claims = keys.validate_jwt(&token).unwrap();
        assert_eq!(claims.sub, "alice");

        let other = SessionKeys::new(b"another-secret", 60);
        assert!(other.validate_jwt(&token).is_err());
    }
}
