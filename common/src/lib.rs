//! Spot Share Common Library
//!
//! CLIとワークフローで共有されるスポットの型とユーティリティ

pub mod types;
pub mod category;
pub mod tags;
pub mod error;

pub use types::{LocationPoint, NewSpot, Spot, SpotId};
pub use category::{CategoryId, CategoryItem, format_category_label};
pub use tags::{join_tags, parse_tags};
pub use error::{Error, Result};
