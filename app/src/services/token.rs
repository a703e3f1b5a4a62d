// app/src/services/token.rs

//! HS256 JSON Web Tokens signed with the configured secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Role, UserRow};

const INVALID_TOKEN: &str = "Invalid token";

/// Token payload. Only `sub` is trusted after verification; the rest is a
/// convenience snapshot for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub sub: Uuid,
  pub email: String,
  pub is_admin: bool,
  pub role: Role,
  pub iat: i64,
  pub exp: i64,
}

pub struct TokenSigner {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validation: Validation,
  lifetime: Duration,
}

impl TokenSigner {
  pub fn new(secret: impl AsRef<[u8]>, lifetime: Duration) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    TokenSigner {
      encoding: EncodingKey::from_secret(secret.as_ref()),
      decoding: DecodingKey::from_secret(secret.as_ref()),
      validation,
      lifetime,
    }
  }

  #[instrument(name = "token::issue", skip(self, user), fields(user_id = %user.id))]
  pub fn issue(&self, user: &UserRow, now: DateTime<Utc>) -> Result<String> {
    let expires_at = now
      .checked_add_signed(self.lifetime)
      .ok_or_else(|| AppError::Config("Token lifetime is out of range".to_string()))?;
    let role = user.role();
    let claims = Claims {
      sub: user.id,
      email: user.email.clone(),
      is_admin: role == Role::Admin,
      role,
      iat: now.timestamp(),
      exp: expires_at.timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;
    debug!(exp = claims.exp, "Token issued.");
    Ok(token)
  }

  /// Signature, algorithm and wall-clock expiry are checked by `jsonwebtoken`;
  /// `now` is checked against `exp` as well. Every failure is the same
  /// `Unauthorized("Invalid token")`; the reason is only logged.
  #[instrument(name = "token::verify", skip_all)]
  pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
    let reject = |reason: &str| {
      warn!(reason, "Token rejected.");
      AppError::Unauthorized(INVALID_TOKEN.to_string())
    };

    let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| reject(&e.to_string()))?;
    if data.claims.exp <= now.timestamp() {
      return Err(reject("expired"));
    }
    Ok(data.claims)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> UserRow {
    UserRow {
      id: Uuid::new_v4(),
      full_name: "Tran Thi B".to_string(),
      email: "b@example.com".to_string(),
      password: String::new(),
      role: Some("admin".to_string()),
      phone: None,
      created_at: Utc::now(),
      updated_at: None,
    }
  }

  #[test]
  fn issued_token_verifies_and_carries_claims() {
    let signer = TokenSigner::new("s3cret", Duration::hours(1));
    let user = user();
    let now = Utc::now();
    let token = signer.issue(&user, now).unwrap();
    let claims = signer.verify(&token, now).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, "b@example.com");
    assert!(claims.is_admin);
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 3600);
  }

  #[test]
  fn rejects_other_secret_tampering_and_expiry() {
    let signer = TokenSigner::new("s3cret", Duration::hours(1));
    let now = Utc::now();
    let token = signer.issue(&user(), now).unwrap();

    let other = TokenSigner::new("another", Duration::hours(1));
    assert!(matches!(other.verify(&token, now), Err(AppError::Unauthorized(m)) if m == "Invalid token"));

    // Payload of a second token spliced under the first token's signature.
    let second = signer.issue(&user(), now).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = second.split('.').nth(1).unwrap();
    assert!(matches!(signer.verify(&parts.join("."), now), Err(AppError::Unauthorized(_))));

    let later = now + Duration::hours(2);
    assert!(matches!(signer.verify(&token, later), Err(AppError::Unauthorized(_))));

    assert!(matches!(signer.verify("not-a-token", now), Err(AppError::Unauthorized(_))));
  }

  #[test]
  fn token_already_expired_by_wall_clock_is_rejected() {
    let signer = TokenSigner::new("s3cret", Duration::minutes(5));
    let issued = Utc::now() - Duration::hours(1);
    let token = signer.issue(&user(), issued).unwrap();
    assert!(matches!(signer.verify(&token, issued), Err(AppError::Unauthorized(_))));
  }

  #[test]
  fn out_of_range_lifetime_is_an_error_not_a_panic() {
    let signer = TokenSigner::new("s3cret", Duration::seconds(9_000_000_000_000));
    let result = signer.issue(&user(), Utc::now());
    assert!(matches!(result, Err(AppError::Config(_))));
  }
}
