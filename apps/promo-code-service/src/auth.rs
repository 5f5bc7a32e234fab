//! # 認証
//!
//! Bearer トークンを検証し、呼び出し元の主体（[`Principal`]）を組み立てる。
//!
//! ## ロールの読み取り元
//!
//! 次のクレームからロールを集め、正規化（トリム・大文字化・`ROLE_` 接頭辞除去）
//! したうえで和集合を取る。
//!
//! | クレーム | 例 |
//! |---------|----|
//! | `realm_access.roles` | `{"realm_access": {"roles": ["admin"]}}` |
//! | `roles` | `{"roles": ["ROLE_BUSINESS"]}` |
//! | `resource_access.<client_id>.roles` | `{"resource_access": {"promo": {"roles": ["admin"]}}}` |
//!
//! ## テナントクレーム
//!
//! トークンの `tenant_id`（文字列）はテナント解決のフォールバックに使う。

use std::{collections::BTreeSet, fmt, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Map, Value};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::config::JwtConfig;

/// テナントを運ぶクレーム名
pub const TENANT_CLAIM: &str = "tenant_id";

/// サービスが認可に使うロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 作成・更新・削除・参照
    Admin,
    /// 参照のみ
    Business,
}

/// 認証済みの呼び出し元
pub trait Principal: Send + Sync + fmt::Debug {
    /// 主体の識別子（`sub`）
    fn subject(&self) -> &str;

    /// 正規化済みロール
    fn roles(&self) -> &BTreeSet<String>;

    /// 任意のクレーム
    fn claim(&self, name: &str) -> Option<&Value>;

    fn has_role(&self, role: Role) -> bool {
        let name: &'static str = role.into();
        self.roles().contains(name)
    }

    fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// テナントクレーム（文字列でなければ `None`）
    fn tenant_claim(&self) -> Option<&str> {
        self.claim(TENANT_CLAIM).and_then(Value::as_str)
    }
}

/// トークンのクレームから組み立てた主体
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedPrincipal {
    subject: String,
    roles:   BTreeSet<String>,
    claims:  Map<String, Value>,
}

impl AuthenticatedPrincipal {
    /// クレームから主体を組み立てる
    ///
    /// `client_id` が指定されていれば `resource_access.<client_id>.roles` も読む。
    pub fn from_claims(claims: Map<String, Value>, client_id: Option<&str>) -> Self {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut roles = BTreeSet::new();
        collect_roles(claims.get("realm_access").and_then(|v| v.get("roles")), &mut roles);
        collect_roles(claims.get("roles"), &mut roles);
        if let Some(client) = client_id {
            collect_roles(
                claims
                    .get("resource_access")
                    .and_then(|v| v.get(client))
                    .and_then(|v| v.get("roles")),
                &mut roles,
            );
        }

        Self {
            subject,
            roles,
            claims,
        }
    }
}

impl Principal for AuthenticatedPrincipal {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

fn collect_roles(value: Option<&Value>, roles: &mut BTreeSet<String>) {
    let Some(Value::Array(items)) = value else {
        return;
    };
    roles.extend(
        items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_role),
    );
}

/// ロール名を正規化する（空になる場合は `None`）
pub fn normalize_role(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
    (!name.is_empty()).then(|| name.to_string())
}

/// リクエスト拡張に格納する認証済み主体
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Arc<dyn Principal>);

/// 認証エラー
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("認証トークンがありません")]
    MissingToken,

    #[error("認証トークンが不正です: {0}")]
    InvalidToken(String),

    #[error("認証設定が不正です: {0}")]
    Configuration(String),
}

/// トークン検証器
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError>;
}

/// JWT 検証器
///
/// 署名・有効期限（`exp`）に加え、設定されていれば `iss` と `aud` を検証する。
pub struct JwtVerifier {
    key:        DecodingKey,
    validation: Validation,
    client_id:  Option<String>,
}

impl JwtVerifier {
    pub fn from_config(config: &JwtConfig) -> Result<Self, AuthError> {
        let key = match config.algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = config
                    .secret
                    .as_deref()
                    .ok_or_else(|| AuthError::Configuration("共有鍵がありません".to_string()))?;
                DecodingKey::from_secret(secret.as_bytes())
            }
            Algorithm::RS256 => {
                let pem = config
                    .public_key_pem
                    .as_deref()
                    .ok_or_else(|| AuthError::Configuration("公開鍵がありません".to_string()))?;
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::Configuration(e.to_string()))?
            }
            other => {
                return Err(AuthError::Configuration(format!(
                    "未対応のアルゴリズムです: {other:?}"
                )));
            }
        };

        let mut validation = Validation::new(config.algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key,
            validation,
            client_id: config.client_id.clone(),
        })
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(AuthenticatedPrincipal::from_claims(
            data.claims,
            self.client_id.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret";

    fn hs256_config() -> JwtConfig {
        JwtConfig {
            algorithm:      Algorithm::HS256,
            secret:         Some(SECRET.to_string()),
            public_key_pem: None,
            issuer:         Some("https://issuer.example.com".to_string()),
            audience:       None,
            client_id:      Some("promo".to_string()),
        }
    }

    fn sign(claims: Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn claims(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[rstest]
    #[case::小文字("admin", Some("ADMIN"))]
    #[case::接頭辞付き("ROLE_BUSINESS", Some("BUSINESS"))]
    #[case::前後空白("  role_admin ", Some("ADMIN"))]
    #[case::空文字("", None)]
    #[case::接頭辞のみ("ROLE_", None)]
    fn test_ロール名の正規化(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_role(raw).as_deref(), expected);
    }

    #[test]
    fn test_3つのクレームからロールを集める() {
        let principal = AuthenticatedPrincipal::from_claims(
            claims(json!({
                "sub": "user-1",
                "realm_access": { "roles": ["admin"] },
                "roles": ["ROLE_BUSINESS", 42],
                "resource_access": {
                    "promo": { "roles": ["auditor"] },
                    "other": { "roles": ["ignored"] }
                }
            })),
            Some("promo"),
        );

        assert_eq!(principal.subject(), "user-1");
        assert_eq!(
            principal.roles().iter().cloned().collect::<Vec<_>>(),
            vec!["ADMIN", "AUDITOR", "BUSINESS"]
        );
        assert!(principal.has_role(Role::Admin));
        assert!(principal.has_any_role(&[Role::Business]));
    }

    #[test]
    fn test_tenant_idクレームは文字列のときだけ読む() {
        let with_tenant =
            AuthenticatedPrincipal::from_claims(claims(json!({ "tenant_id": "acme" })), None);
        let numeric =
            AuthenticatedPrincipal::from_claims(claims(json!({ "tenant_id": 1 })), None);

        assert_eq!(with_tenant.tenant_claim(), Some("acme"));
        assert_eq!(numeric.tenant_claim(), None);
    }

    #[test]
    fn test_正しく署名されたトークンを検証できる() {
        let verifier = JwtVerifier::from_config(&hs256_config()).unwrap();
        let token = sign(json!({
            "sub": "user-1",
            "iss": "https://issuer.example.com",
            "exp": exp(),
            "roles": ["admin"],
            "tenant_id": "acme"
        }));

        let principal = verifier.verify(&token).unwrap();

        assert!(principal.has_role(Role::Admin));
        assert_eq!(principal.tenant_claim(), Some("acme"));
    }

    #[rstest]
    #[case::発行者違い(json!({ "sub": "u", "iss": "https://evil.example.com", "exp": exp() }))]
    #[case::期限切れ(json!({ "sub": "u", "iss": "https://issuer.example.com", "exp": 1_000_000 }))]
    #[case::exp無し(json!({ "sub": "u", "iss": "https://issuer.example.com" }))]
    fn test_不正なトークンは拒否される(#[case] payload: Value) {
        let verifier = JwtVerifier::from_config(&hs256_config()).unwrap();

        let result = verifier.verify(&sign(payload));

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_別の鍵で署名されたトークンは拒否される() {
        let verifier = JwtVerifier::from_config(&hs256_config()).unwrap();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": "u", "iss": "https://issuer.example.com", "exp": exp() }),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_audience設定時は一致しないaudを拒否する() {
        let config = JwtConfig {
            audience: Some("promo-api".to_string()),
            ..hs256_config()
        };
        let verifier = JwtVerifier::from_config(&config).unwrap();
        let ok = sign(json!({
            "sub": "u", "iss": "https://issuer.example.com", "aud": "promo-api", "exp": exp()
        }));
        let ng = sign(json!({
            "sub": "u", "iss": "https://issuer.example.com", "aud": "other", "exp": exp()
        }));

        assert!(verifier.verify(&ok).is_ok());
        assert!(verifier.verify(&ng).is_err());
    }
}
