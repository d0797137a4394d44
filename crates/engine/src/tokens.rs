//! Signed, time-limited bearer tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`.
//! The issuer never touches storage; it only encodes, signs and verifies.
//! The signing secret is handed over once, at construction, and rotating it
//! invalidates every outstanding token.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

type HmacSha256 = Hmac<Sha256>;

/// Value of the `iss` claim on every token.
pub const TOKEN_ISSUER: &str = "finance-api";

/// Lifetime of a token in seconds, counted from issuance.
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims embedded in a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id as a string.
    pub sub: String,
    pub user_id: Uuid,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Random nonce; two tokens issued in the same second still differ.
    pub jti: Uuid,
}

/// A freshly signed token with its absolute expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Builds an issuer around the process-wide signing secret.
    ///
    /// Fails with [`EngineError::Configuration`] when the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> ResultEngine<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(EngineError::Configuration(
                "token signing secret is not set".to_string(),
            ));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> ResultEngine<IssuedToken> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<IssuedToken> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + TOKEN_LIFETIME_SECS;
        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let expires_at = DateTime::from_timestamp(expires_at, 0).ok_or_else(|| {
            EngineError::Configuration("token expiry out of range".to_string())
        })?;

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> ResultEngine<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature, issuer and validity window against `now`.
    ///
    /// Every failure is reported as [`EngineError::InvalidToken`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> ResultEngine<Claims> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(invalid("malformed token"));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(invalid("unsupported signing algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| invalid("malformed token"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.iss != TOKEN_ISSUER {
            return Err(invalid("unexpected issuer"));
        }
        let now = now.timestamp();
        if now >= claims.exp {
            return Err(invalid("token expired"));
        }
        if now < claims.nbf {
            return Err(invalid("token not yet valid"));
        }

        Ok(claims)
    }

    fn mac(&self) -> ResultEngine<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| EngineError::Configuration(err.to_string()))
    }
}

fn invalid(reason: &str) -> EngineError {
    EngineError::InvalidToken(reason.to_string())
}

fn encode_segment<T: Serialize>(value: &T) -> ResultEngine<String> {
    let bytes =
        serde_json::to_vec(value).map_err(|err| EngineError::Configuration(err.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> ResultEngine<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid("malformed token"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("malformed token"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret").unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn claims_carry_identity_and_lifetime() {
        let user_id = Uuid::new_v4();
        let issued = issuer().issue_at(user_id, "a@x.com", t0()).unwrap();
        assert_eq!(issued.expires_at, t0() + TimeDelta::hours(24));

        let claims = issuer().verify_at(&issued.token, t0()).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn token_valid_until_just_before_expiry() {
        let issued = issuer().issue_at(Uuid::new_v4(), "a@x.com", t0()).unwrap();

        let almost = t0() + TimeDelta::hours(23) + TimeDelta::minutes(59);
        assert!(issuer().verify_at(&issued.token, almost).is_ok());

        let late = t0() + TimeDelta::hours(24) + TimeDelta::minutes(1);
        assert_eq!(
            issuer().verify_at(&issued.token, late),
            Err(EngineError::InvalidToken("token expired".to_string()))
        );
    }

    #[test]
    fn tokens_from_same_instant_differ() {
        let user_id = Uuid::new_v4();
        let a = issuer().issue_at(user_id, "a@x.com", t0()).unwrap();
        let b = issuer().issue_at(user_id, "a@x.com", t0()).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn other_secret_is_rejected() {
        let issued = issuer().issue_at(Uuid::new_v4(), "a@x.com", t0()).unwrap();
        let other = TokenIssuer::new("rotated-secret").unwrap();
        assert_eq!(
            other.verify_at(&issued.token, t0()),
            Err(EngineError::InvalidToken("signature mismatch".to_string()))
        );
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let issued = issuer().issue_at(Uuid::new_v4(), "a@x.com", t0()).unwrap();
        let forged = issuer().issue_at(Uuid::new_v4(), "evil@x.com", t0()).unwrap();
        let mut parts: Vec<&str> = issued.token.split('.').collect();
        parts[1] = forged.token.split('.').nth(1).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(
            issuer().verify_at(&tampered, t0()),
            Err(EngineError::InvalidToken(_))
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(
                matches!(
                    issuer().verify_at(token, t0()),
                    Err(EngineError::InvalidToken(_))
                ),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(
            TokenIssuer::new(""),
            Err(EngineError::Configuration(_))
        ));
    }
}
