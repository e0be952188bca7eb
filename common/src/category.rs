//! カテゴリ定義
//!
//! サーバー側の列挙値（例: `parks_and_reserves`）と表示用ラベルの対応

use serde::{Deserialize, Serialize};
use std::fmt;

/// サーバー定義の列挙値
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ピックリストの1項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub label: String,
    pub value: CategoryId,
}

impl CategoryItem {
    pub fn from_raw(raw: &str) -> Self {
        Self {
            label: format_category_label(raw),
            value: CategoryId::new(raw),
        }
    }
}

/// 列挙値を表示用ラベルへ変換
///
/// `_` を空白に置換し、単語の先頭文字を大文字にする。
/// 単語境界は英数字とそれ以外の切り替わり。
pub fn format_category_label(raw: &str) -> String {
    let mut label = String::with_capacity(raw.len());
    let mut prev_is_word = false;

    for c in raw.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_alphanumeric();
        if is_word && !prev_is_word {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        prev_is_word = is_word;
    }

    label
}
