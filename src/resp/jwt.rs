use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::time::OffsetDateTime;
use serde::{Deserialize, Serialize};

use crate::data::student::StudentId;
use crate::resp::problem::Problem;
use crate::security::Security;

pub static AUTH_COOKIE_NAME: &str = "workload_session";

/// Claims of the session cookie issued after a successful identity assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(with = "jwt_numeric_date")]
    iat: DateTime<Utc>,
    #[serde(with = "jwt_numeric_date")]
    exp: DateTime<Utc>,
    pub sub: StudentId,
}

impl SessionToken {
    pub fn new(student: &StudentId, lifetime: Duration) -> SessionToken {
        let now = Utc::now();
        SessionToken {
            iat: now,
            exp: now + lifetime,
            sub: student.clone(),
        }
    }

    pub fn encode_jwt(&self, security: &Security) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::PS256);
        encode(&header, self, security.encoding_key())
    }

    pub fn cookie(
        &self,
        security: &Security,
    ) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        Ok(Cookie::build((AUTH_COOKIE_NAME, self.encode_jwt(security)?))
            .secure(true)
            .expires(OffsetDateTime::from_unix_timestamp(self.exp.timestamp()).ok())
            .path("/")
            .http_only(true)
            .build())
    }
}

pub fn auth_problem(detail: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authenticate student.")
        .detail(detail)
        .clone()
}

pub fn decode_token(token: &str, security: &Security) -> Result<SessionToken, Problem> {
    decode::<SessionToken>(
        token,
        security.decoding_key(),
        &Validation::new(Algorithm::PS256),
    )
    .map(|data| data.claims)
    .map_err(Problem::from)
}

pub fn extract_claims(cookies: &CookieJar, security: &Security) -> Result<SessionToken, Problem> {
    let token = match cookies.get(AUTH_COOKIE_NAME) {
        Some(jwt) => jwt.value().to_owned(),
        None => {
            return Err(auth_problem("No session cookie."));
        }
    };
    tracing::trace!("extracted session token from cookie");

    let claims = decode_token(&token, security)?;
    tracing::debug!("decoded session token for student: {}", claims.sub);
    Ok(claims)
}

mod jwt_numeric_date {
    //! Serializes `DateTime<Utc>` as a JWT "Numeric Date" (RFC 7519 section 2).
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(date.timestamp())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Utc.timestamp_opt(i64::deserialize(deserializer)?, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom("Invalid Unix timestamp value."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::test_security;
    use chrono::SubsecRound;

    #[test]
    fn session_token_roundtrips() {
        let security = test_security();
        let now = Utc::now().round_subsecs(0);
        let token = SessionToken {
            iat: now,
            exp: now + Duration::days(7),
            sub: StudentId::from("student1"),
        };

        let jwt = token
            .encode_jwt(&security)
            .expect("encoding should work for example");
        let decoded = decode_token(&jwt, &security).expect("token should decode");

        assert_eq!(decoded, token);
    }

    #[test]
    fn expired_token_is_rejected() {
        let security = test_security();
        let issued = Utc::now() - Duration::days(30);
        let token = SessionToken {
            iat: issued,
            exp: issued + Duration::days(7),
            sub: StudentId::from("student1"),
        };

        let jwt = token.encode_jwt(&security).unwrap();
        let problem = decode_token(&jwt, &security).unwrap_err();
        assert_eq!(problem.status, Status::Unauthorized);
        assert_eq!(problem.title, "Expired session token.");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let security = test_security();
        let jwt = SessionToken::new(&StudentId::from("student1"), Duration::days(1))
            .encode_jwt(&security)
            .unwrap();

        let tampered = format!("{}x", jwt);
        assert!(decode_token(&tampered, &security).is_err());
    }
}
