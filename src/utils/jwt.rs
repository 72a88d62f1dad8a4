use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::{EvalSystemError, Result};
use crate::models::users::entities::{Identity, UserRole};

// JWT Claims 结构体（令牌由外部身份层签发）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (user ID)
    pub role: String, // 用户角色
    pub exp: usize,   // Expiration time (时间戳)
    pub iat: usize,   // Issued at (签发时间)
}

impl Claims {
    /// 转换为核心层使用的调用方身份
    pub fn identity(&self) -> Result<Identity> {
        let user_id = self
            .sub
            .parse::<i64>()
            .map_err(|_| EvalSystemError::authentication("Invalid user ID in JWT"))?;
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(EvalSystemError::authentication)?;
        Ok(Identity::new(user_id, role))
    }
}

pub struct JwtUtils;

impl JwtUtils {
    // 生成带自定义过期时间的 Token
    pub fn generate_token(
        identity: Identity,
        secret: &str,
        expiry_duration: chrono::Duration,
    ) -> std::result::Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expiration = now + expiry_duration;

        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }

    // 验证 JWT token
    pub fn verify_token(
        token: &str,
        secret: &str,
    ) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let validation = Validation::default();

        decode::<Claims>(token, &decoding_key, &validation).map(|token_data| token_data.claims)
    }

    /// 校验令牌并解析出调用方身份
    pub fn identity_from_token(token: &str, secret: &str) -> Result<Identity> {
        if secret.is_empty() {
            return Err(EvalSystemError::authentication(
                "JWT secret is not configured",
            ));
        }
        let claims = Self::verify_token(token, secret)
            .map_err(|e| EvalSystemError::authentication(format!("Invalid JWT token: {e}")))?;
        claims.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_token_resolves_identity() {
        let token =
            JwtUtils::generate_token(Identity::admin(7), SECRET, chrono::Duration::minutes(5))
                .unwrap();
        let identity = JwtUtils::identity_from_token(&token, SECRET).unwrap();
        assert_eq!(identity, Identity::admin(7));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token =
            JwtUtils::generate_token(Identity::user(3), SECRET, chrono::Duration::minutes(5))
                .unwrap();
        assert!(JwtUtils::identity_from_token(&token, "other").is_err());
        assert!(JwtUtils::identity_from_token(&token, "").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token =
            JwtUtils::generate_token(Identity::user(3), SECRET, chrono::Duration::minutes(-10))
                .unwrap();
        assert!(JwtUtils::identity_from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let claims = Claims {
            sub: "1".into(),
            role: "teacher".into(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.identity().is_err());
    }
}
