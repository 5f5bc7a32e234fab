//! 金額の JSON 表現
//!
//! serde_json は小数を f64 として読むため、`NUMERIC(19, 2)` の金額は有効桁が落ちる。
//! 数値トークンを [`RawValue`] のまま受け取り、そのテキストから直接 [`Decimal`] を作る。
//! 出力も `Decimal` の文字列表現をそのまま数値トークンとして書き出す。

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::Error as _};
use serde_json::value::RawValue;

/// 数値トークン（または数値を表す JSON 文字列）を `Decimal` にする
fn parse(raw: &RawValue) -> Option<Decimal> {
    let token = raw.get().trim();
    let text = serde_json::from_str::<String>(token).unwrap_or_else(|_| token.to_string());
    let text = text.trim();
    Decimal::from_str_exact(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn invalid<E: serde::de::Error>(raw: &RawValue) -> E {
    E::custom(format!("金額として解釈できません: {}", raw.get()))
}

pub(crate) fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    RawValue::from_string(value.to_string())
        .map_err(S::Error::custom)?
        .serialize(serializer)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| invalid(&raw))
}

/// `Option<Decimal>` 用（`null` は `None`）
pub(crate) mod option {
    use super::*;

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        match Option::<Box<RawValue>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(&raw).map(Some).ok_or_else(|| invalid(&raw)),
        }
    }
}
