use crate::config::AppConfig;
use crate::models::auth::entities::{AuthUser, UserRole};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";

// JWT Claims，令牌由统一登录服务签发
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户 ID
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub token_type: String, // "access" 或 "refresh"
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    /// 转为请求上下文中的用户，未知角色直接忽略
    pub fn into_auth_user(self) -> AuthUser {
        let roles = self
            .roles
            .iter()
            .filter_map(|r| r.parse::<UserRole>().ok())
            .collect();
        AuthUser {
            id: self.sub,
            name: self.name,
            roles,
        }
    }
}

pub struct JwtUtils;

impl JwtUtils {
    fn get_secret() -> String {
        AppConfig::get().jwt.secret.clone()
    }

    /// 使用配置中的密钥验证 Access Token
    pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let leeway = AppConfig::get().jwt.leeway;
        Self::verify_access_token_with(token, &Self::get_secret(), leeway)
    }

    pub fn verify_access_token_with(
        token: &str,
        secret: &str,
        leeway: u64,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        // 空密钥签出的令牌任何人都能伪造
        if secret.is_empty() {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidKeyFormat,
            ));
        }
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let mut validation = Validation::default();
        validation.leeway = leeway;

        let claims = decode::<Claims>(token, &decoding_key, &validation)?.claims;
        if claims.token_type != ACCESS_TOKEN {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }
        Ok(claims)
    }

    /// 签发 Access Token（运维脚本与测试使用）
    pub fn generate_access_token_with(
        user: &AuthUser,
        secret: &str,
        expiry: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            name: user.name.clone(),
            roles: user.roles.iter().map(|r| r.to_string()).collect(),
            token_type: ACCESS_TOKEN.to_string(),
            exp: (now + expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }
}
