use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User name
    pub uid: i32,     // User ID
    pub role: String, // Role at the time of login
    pub exp: usize,   // Expiration timestamp
}

/// Sign a new bearer token for a user, valid for `ttl_hours`.
pub fn sign(user_id: i32, name: &str, role: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .context("token expiration overflows")?
        .timestamp();

    let claims = Claims {
        sub: name.to_owned(),
        uid: user_id,
        role: role.to_owned(),
        exp: usize::try_from(expiration).context("token expiration before epoch")?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a bearer token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
