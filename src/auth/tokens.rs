use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::dto::{AccountView, Session};
use super::services::ensure_active;
use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::users::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    kind: TokenKind,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

fn invalid_token() -> ApiError {
    ApiError::Unauthorized("Invalid or expired token".into())
}

/// HS256 signer for the service's bearer tokens, built once from `JwtConfig`.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&cfg.issuer]);
        validation.set_audience(&[&cfg.audience]);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::minutes(cfg.ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        }
    }

    fn sign_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            kind,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("sign token")?;
        debug!(%user_id, ?kind, "token signed");
        Ok(token)
    }

    pub(crate) fn sign(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        self.sign_at(user_id, kind, OffsetDateTime::now_utc())
    }

    /// Issues a fresh access/refresh pair. Accounts that are not approved
    /// get the same 403 that login gives them.
    pub fn issue(&self, user: &User) -> Result<Session, ApiError> {
        ensure_active(user)?;
        Ok(Session {
            access_token: self.sign(user.id, TokenKind::Access)?,
            refresh_token: self.sign(user.id, TokenKind::Refresh)?,
            user: AccountView::from(user),
        })
    }

    /// Subject of a valid, unexpired token of the expected kind. Every
    /// failure maps to the same 401 so the client learns nothing more.
    pub fn subject(&self, token: &str, expected: TokenKind) -> Result<Uuid, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                invalid_token()
            })?
            .claims;
        if claims.kind != expected {
            debug!(?expected, got = ?claims.kind, "token kind mismatch");
            return Err(invalid_token());
        }
        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{Role, UserStatus};

    fn signer() -> TokenSigner {
        TokenSigner::new(&JwtConfig {
            secret: "unit-secret".into(),
            issuer: "cri-accounts".into(),
            audience: "cri-users".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    fn account(status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Jane Smith".into(),
            email: "jane@example.com".into(),
            password_hash: String::new(),
            role: Role::User,
            status,
            approved_by: None,
            approved_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn is_invalid_token(err: ApiError) -> bool {
        matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid or expired token")
    }

    #[test]
    fn session_tokens_only_work_as_their_own_kind() {
        let signer = signer();
        let jane = account(UserStatus::Approved);
        let session = signer.issue(&jane).unwrap();
        assert_eq!(session.user.id, jane.id);

        assert_eq!(signer.subject(&session.access_token, TokenKind::Access).unwrap(), jane.id);
        assert_eq!(signer.subject(&session.refresh_token, TokenKind::Refresh).unwrap(), jane.id);
        assert!(is_invalid_token(
            signer.subject(&session.access_token, TokenKind::Refresh).unwrap_err()
        ));
        assert!(is_invalid_token(
            signer.subject(&session.refresh_token, TokenKind::Access).unwrap_err()
        ));
    }

    #[test]
    fn undecided_and_rejected_accounts_get_no_tokens() {
        let signer = signer();
        let pending = signer.issue(&account(UserStatus::Pending)).unwrap_err();
        assert!(matches!(pending, ApiError::Forbidden(ref m) if m == "Account is pending approval"));
        let rejected = signer.issue(&account(UserStatus::Rejected)).unwrap_err();
        assert!(matches!(rejected, ApiError::Forbidden(ref m) if m == "Account has been rejected"));
    }

    #[test]
    fn expired_and_tampered_tokens_are_refused() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let stale = signer
            .sign_at(user_id, TokenKind::Access, OffsetDateTime::now_utc() - Duration::hours(2))
            .unwrap();
        assert!(is_invalid_token(signer.subject(&stale, TokenKind::Access).unwrap_err()));

        let genuine = signer.sign(user_id, TokenKind::Access).unwrap();
        let other = signer.sign(Uuid::new_v4(), TokenKind::Access).unwrap();
        let (_, signature) = genuine.rsplit_once('.').unwrap();
        let (body, _) = other.rsplit_once('.').unwrap();
        let forged = format!("{body}.{signature}");
        assert!(is_invalid_token(signer.subject(&forged, TokenKind::Access).unwrap_err()));
    }
}
