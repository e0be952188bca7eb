//! カテゴリ一覧の取得
//!
//! ワークフロー生成ごとに一度だけ読み込む。失敗しても自動再試行はせず、
//! ピックリストを空のまま残してフォームの他の入力は続行できる。

use crate::error::{Result, SpotError};
use crate::services::PersistenceService;
use spot_share_common::{CategoryId, CategoryItem};
use std::sync::Arc;
use tracing::{info, warn};

/// ドラフトを借用しない読み込み口
#[derive(Clone)]
pub struct CategoryCatalog {
    persistence: Arc<dyn PersistenceService>,
    procedure: String,
}

impl CategoryCatalog {
    pub fn new(persistence: Arc<dyn PersistenceService>, procedure: impl Into<String>) -> Self {
        Self { persistence, procedure: procedure.into() }
    }

    pub async fn load(&self) -> Result<Vec<CategoryItem>> {
        let raw = self
            .persistence
            .rpc_strings(&self.procedure)
            .await
            .map_err(|e| {
                warn!(procedure = %self.procedure, error = %e, "category fetch failed");
                SpotError::CatalogLoad(e)
            })?;

        let items: Vec<CategoryItem> = raw.iter().map(|v| CategoryItem::from_raw(v)).collect();
        info!(count = items.len(), "categories loaded");
        Ok(items)
    }
}

/// ピックリストの状態
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CatalogState {
    #[default]
    Loading,
    Ready(Vec<CategoryItem>),
    /// 取得失敗（ピックリストは空）
    Failed(String),
}

impl CatalogState {
    pub fn items(&self) -> &[CategoryItem] {
        match self {
            CatalogState::Ready(items) => items,
            _ => &[],
        }
    }

    pub fn find(&self, value: &str) -> Option<&CategoryItem> {
        self.items().iter().find(|item| item.value.as_str() == value)
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.items().iter().any(|item| &item.value == id)
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, CatalogState::Loading)
    }
}
