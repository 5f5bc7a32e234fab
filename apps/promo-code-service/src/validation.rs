//! # リクエストボディの抽出とバリデーション
//!
//! - [`JsonBody`]: JSON として解釈できないボディを 400 Problem Details にする
//! - [`ValidatedJson`]: さらに [`ValidatedRequest::into_validated`] で検証と変換を
//!   1 回で行い、違反をフィールド単位で返す

use std::borrow::Cow;

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use promocode_shared::FieldError;
use serde::de::DeserializeOwned;
use validator::{ValidationError, ValidationErrors};

use crate::error::CoreError;

/// JSON ボディ抽出器（拒否時は [`CoreError::BadRequest`]）
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| CoreError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// 検証しながら検証済みの値へ変換できるリクエストボディ
pub trait ValidatedRequest: DeserializeOwned {
    /// 検証済みの値
    type Validated;

    /// 全フィールドを検証し、違反があればまとめて返す
    fn into_validated(self) -> Result<Self::Validated, ValidationErrors>;
}

/// バリデーション付き JSON ボディ抽出器
///
/// ボディを `T` として読み、検証済みの `T::Validated` をハンドラに渡す。
///
/// ```ignore
/// async fn handler(ValidatedJson(details): ValidatedJson<PromoCodeRequest>) {
///     // details は検証済みの PromoCodeDetails
/// }
/// ```
pub struct ValidatedJson<T: ValidatedRequest>(pub T::Validated);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: ValidatedRequest,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        Ok(Self(value.into_validated()?))
    }
}

/// `ValidationErrors` をフィールド名順の [`FieldError`] 一覧にする
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut result: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string);
                FieldError::new(field.to_string(), message)
            })
        })
        .collect();
    result.sort_by(|a, b| a.field.cmp(&b.field));
    result
}

/// メッセージ付きの `ValidationError` を追加する
pub(crate) fn add_error(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    errors.add(field, error);
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request as HttpRequest, StatusCode},
        routing::post,
    };
    use pretty_assertions::assert_eq;
    use promocode_shared::ErrorResponse;
    use serde::Deserialize;
    use tower::ServiceExt;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Member {
        name:  Option<String>,
        count: Option<i32>,
    }

    impl ValidatedRequest for Member {
        type Validated = String;

        fn into_validated(self) -> Result<String, ValidationErrors> {
            let mut errors = ValidationErrors::new();
            if self.name.is_none() {
                add_error(&mut errors, "name", "required", "名前は必須です");
            }
            if self.count.is_some_and(|c| c < 0) {
                add_error(&mut errors, "count", "range", "0 以上を指定してください");
            }
            match self.name {
                Some(name) if errors.is_empty() => Ok(name),
                _ => Err(errors),
            }
        }
    }

    async fn handler(ValidatedJson(name): ValidatedJson<Member>) -> String {
        name
    }

    async fn send(body: &str) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route("/members", post(handler));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/members")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_妥当なボディは通過する() {
        let (status, body) = send(r#"{"name": "ok", "count": 1}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_違反はフィールド名順に返る() {
        let (status, body) = send(r#"{"count": -1}"#).await;
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            error.errors,
            Some(vec![
                FieldError::new("count", "0 以上を指定してください"),
                FieldError::new("name", "名前は必須です"),
            ])
        );
    }

    static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Deserialize)]
    struct Counted {
        value: i32,
    }

    impl ValidatedRequest for Counted {
        type Validated = i32;

        fn into_validated(self) -> Result<i32, ValidationErrors> {
            COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }
    }

    #[tokio::test]
    async fn test_検証はリクエストごとに1回だけ行う() {
        let app = Router::new().route(
            "/counted",
            post(|ValidatedJson(value): ValidatedJson<Counted>| async move { value.to_string() }),
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/counted")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"value": 3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_json構文エラーはbad_requestになる() {
        let (status, body) = send("{not json").await;
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.error_type.ends_with("bad-request"));
    }
}
