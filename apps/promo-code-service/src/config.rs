//! # サービス設定
//!
//! 環境変数から PromoCode Service の設定を読み込む。
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|-----------|------|
//! | `PROMO_HOST` | No | `0.0.0.0` | バインドアドレス |
//! | `PROMO_PORT` | No | `8081` | ポート番号 |
//! | `DATABASE_URL` | **Yes** | - | PostgreSQL 接続 URL |
//! | `DATABASE_MAX_CONNECTIONS` | No | `10` | 接続プールの最大接続数 |
//! | `TENANT_HEADER` | No | `X-Tenant-ID` | テナント ID を運ぶヘッダー名 |
//! | `RUN_MIGRATIONS` | No | `true` | 起動時にマイグレーションを適用するか |
//! | `JWT_ALGORITHM` | No | `HS256` | `HS256` / `HS384` / `HS512` / `RS256` |
//! | `JWT_SECRET` | HS* のとき | - | HMAC 共有鍵 |
//! | `JWT_PUBLIC_KEY_PEM` | RS256 のとき | - | RSA 公開鍵（PEM） |
//! | `JWT_ISSUER` | No | - | 期待する `iss` |
//! | `JWT_AUDIENCE` | No | - | 期待する `aud` |
//! | `JWT_CLIENT_ID` | No | - | `resource_access.<client>.roles` を読むクライアント ID |

use std::{env, fmt};

use http::HeaderName;
use jsonwebtoken::Algorithm;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TENANT_HEADER: &str = "X-Tenant-ID";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// PromoCode Service の設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 接続プールの最大接続数
    pub database_max_connections: u32,
    /// テナント ID を運ぶヘッダー名
    pub tenant_header: HeaderName,
    /// 起動時にマイグレーションを適用するか
    pub run_migrations: bool,
    /// 認証トークンの検証設定
    pub jwt: JwtConfig,
}

/// 認証トークンの検証設定
#[derive(Clone)]
pub struct JwtConfig {
    pub algorithm:      Algorithm,
    pub secret:         Option<String>,
    pub public_key_pem: Option<String>,
    pub issuer:         Option<String>,
    pub audience:       Option<String>,
    pub client_id:      Option<String>,
}

// 鍵をログに出さない
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("public_key_pem", &self.public_key_pem.as_ref().map(|_| "***"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PROMO_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name:  "PROMO_PORT",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name:  "DATABASE_MAX_CONNECTIONS",
                        value: v,
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let tenant_header_value =
            get("TENANT_HEADER").unwrap_or_else(|| DEFAULT_TENANT_HEADER.to_string());
        let tenant_header =
            HeaderName::from_bytes(tenant_header_value.trim().as_bytes()).map_err(|_| {
                ConfigError::Invalid {
                    name:  "TENANT_HEADER",
                    value: tenant_header_value.clone(),
                }
            })?;

        let run_migrations = match get("RUN_MIGRATIONS") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                name:  "RUN_MIGRATIONS",
                value: v,
            })?,
            None => true,
        };

        Ok(Self {
            host: get("PROMO_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections,
            tenant_header,
            run_migrations,
            jwt: JwtConfig::from_lookup(&get)?,
        })
    }
}

impl JwtConfig {
    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let algorithm = match get("JWT_ALGORITHM") {
            Some(v) => parse_algorithm(&v).ok_or(ConfigError::Invalid {
                name:  "JWT_ALGORITHM",
                value: v,
            })?,
            None => Algorithm::HS256,
        };

        let secret = get("JWT_SECRET");
        // 1 行で渡された PEM の `\n` を改行に戻す
        let public_key_pem = get("JWT_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n"));

        match algorithm {
            Algorithm::RS256 if public_key_pem.is_none() => {
                return Err(ConfigError::Missing("JWT_PUBLIC_KEY_PEM"));
            }
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 if secret.is_none() => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            _ => {}
        }

        Ok(Self {
            algorithm,
            secret,
            public_key_pem,
            issuer: get("JWT_ISSUER"),
            audience: get("JWT_AUDIENCE"),
            client_id: get("JWT_CLIENT_ID"),
        })
    }
}

fn parse_algorithm(value: &str) -> Option<Algorithm> {
    match value.trim().to_ascii_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        "RS256" => Some(Algorithm::RS256),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/promocode"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_最小構成でデフォルト値が使われる() {
        let config = load(MINIMAL).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8081);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.tenant_header.as_str(), "x-tenant-id");
        assert!(config.run_migrations);
        assert_eq!(config.jwt.algorithm, Algorithm::HS256);
        assert!(config.jwt.issuer.is_none());
    }

    #[test]
    fn test_database_urlが無いとエラーになる() {
        let result = load(&[("JWT_SECRET", "secret")]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_hs256で共有鍵が無いとエラーになる() {
        let result = load(&[("DATABASE_URL", "postgres://localhost/promocode")]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_rs256で公開鍵が無いとエラーになる() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/promocode"),
            ("JWT_ALGORITHM", "RS256"),
        ]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_PUBLIC_KEY_PEM"));
    }

    #[rstest]
    #[case::ポート("PROMO_PORT", "not-a-port")]
    #[case::最大接続数ゼロ("DATABASE_MAX_CONNECTIONS", "0")]
    #[case::ヘッダー名("TENANT_HEADER", "X Tenant")]
    #[case::真偽値("RUN_MIGRATIONS", "maybe")]
    #[case::アルゴリズム("JWT_ALGORITHM", "none")]
    fn test_不正な値はinvalidになる(#[case] name: &str, #[case] value: &str) {
        let mut vars = MINIMAL.to_vec();
        vars.push((name, value));

        let err = load(&vars).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: n, .. } if n == name));
    }

    #[test]
    fn test_空文字列は未設定として扱う() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PROMO_PORT", ""));
        vars.push(("JWT_ISSUER", " "));

        let config = load(&vars).unwrap();

        assert_eq!(config.port, 8081);
        assert!(config.jwt.issuer.is_none());
    }

    #[test]
    fn test_debug出力に鍵が含まれない() {
        let config = load(MINIMAL).unwrap();
        let debug = format!("{:?}", config.jwt);

        assert!(!debug.contains("secret\""));
        assert!(debug.contains("***"));
    }
}
