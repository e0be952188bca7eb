//! Spot Share
//!
//! ジオタグ付きスポットの投稿ワークフロー。
//! 永続化・メディアストア・端末機能は `services` のトレイトとして注入する。

pub mod catalog;
pub mod cli;
pub mod config;
pub mod draft;
pub mod error;
pub mod location;
pub mod media;
pub mod memory;
pub mod navigation;
pub mod remote;
pub mod services;
pub mod submit;
pub mod terminal;
pub mod workflow;

pub use draft::{Draft, MissingField, SubmissionState};
pub use error::{Result, SpotError};
pub use workflow::{AddSpotWorkflow, WorkflowSettings};
