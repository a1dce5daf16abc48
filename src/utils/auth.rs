//! Authentication utilities

use anyhow::{anyhow, Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

#[cfg(not(test))]
const PBKDF2_ITERATIONS: u32 = 100_000;
#[cfg(test)]
const PBKDF2_ITERATIONS: u32 = 1_000;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub iat: u64,
    pub exp: u64,
}

/// Hash a password with a fresh random salt.
///
/// The result is self-describing: `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LENGTH] = rand::thread_rng().gen();
    let hash = derive(password, &salt, PBKDF2_ITERATIONS);

    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        PBKDF2_ITERATIONS,
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// verify a password against a stored hash using constant-time comparison
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let mut parts = stored.split('$');
    let (scheme, iterations, salt, hash) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(i), Some(salt), Some(h)) => (s, i, salt, h),
            _ => return Err(anyhow!("Malformed password hash")),
        };

    if scheme != HASH_SCHEME {
        return Err(anyhow!("Unsupported password hash scheme '{}'", scheme));
    }

    let iterations: u32 = iterations.parse().context("Malformed hash iterations")?;
    let salt = hex::decode(salt).context("Malformed hash salt")?;
    let expected = hex::decode(hash).context("Malformed hash digest")?;

    let computed = derive(password, &salt, iterations);
    Ok(computed.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    hash
}

/// create a signed token for a user that lives for `ttl`
pub fn create_jwt(user_id: i64, secret: &str, ttl: Duration) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now
            .checked_add(ttl.as_secs())
            .ok_or_else(|| anyhow!("token lifetime out of range"))?,
    };

    encode_claims(&claims, secret)
}

/// sign arbitrary claims
pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// verify signature and expiry of a token
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}
