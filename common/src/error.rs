//! 共通エラー型

use thiserror::Error;

/// 入力値の検証エラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
