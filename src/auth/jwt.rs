use super::AuthUser;
use crate::error::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an identity service ID token.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// Read the claims of an ID token without verifying its signature.
///
/// The document database verifies the token on every request; the client
/// only needs the uid and verification flag.
pub fn read_claims(token: &str) -> Result<IdTokenClaims> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Build the session user from a freshly issued ID token.
pub fn user_from_token(token: &str, fallback_email: &str) -> Result<AuthUser> {
    let claims = read_claims(token)?;
    Ok(AuthUser {
        uid: claims.sub,
        email: claims.email.unwrap_or_else(|| fallback_email.to_string()),
        email_verified: claims.email_verified.unwrap_or(false),
        id_token: Some(token.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_token(sub: &str, email: Option<&str>, verified: Option<bool>) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;

        let claims = IdTokenClaims {
            sub: sub.to_string(),
            exp: now + 3600,
            iat: Some(now),
            iss: Some("https://securetoken.example/test".to_string()),
            email: email.map(str::to_string),
            email_verified: verified,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"any-key"),
        )
        .unwrap()
    }

    #[test]
    fn test_read_claims_ignores_signature() {
        let token = create_test_token("uid-1", Some("a@b.io"), Some(true));

        let claims = read_claims(&token).unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.io"));
        assert_eq!(claims.email_verified, Some(true));
    }

    #[test]
    fn test_user_from_token_defaults() {
        let token = create_test_token("uid-2", None, None);

        let user = user_from_token(&token, "fallback@b.io").unwrap();
        assert_eq!(user.uid, "uid-2");
        assert_eq!(user.email, "fallback@b.io");
        assert!(!user.email_verified);
        assert_eq!(user.id_token.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_malformed_token() {
        assert!(read_claims("not.a.valid.jwt").is_err());
    }
}
