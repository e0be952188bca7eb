//! 位置選択画面
//!
//! 権限確認 → 現在地取得 → 「この場所にいますか？」の確認 →
//! 現在地を採用、または地図タップで選んで確定。
//! 結果は `LocationReturn` 経由で投稿画面へ一度だけ返す。

use crate::error::SpotError;
use crate::navigation::LocationReturn;
use crate::services::{LocationServices, Notifier, PermissionStatus};
use spot_share_common::LocationPoint;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickerState {
    Idle,
    RequestingPermission,
    /// 権限拒否（座標なしで終了）
    Denied,
    AwaitingFix,
    /// 現在地を取得できなかった（座標なしで終了）
    FixUnavailable,
    ConfirmationPrompt { current: LocationPoint },
    AwaitingTap { center: LocationPoint, selected: Option<LocationPoint> },
    /// 現在地を採用
    Resolved(LocationPoint),
    /// 地図で選んだ地点を確定
    Confirmed(LocationPoint),
    Dismissed,
}

impl PickerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PickerState::Denied
                | PickerState::FixUnavailable
                | PickerState::Resolved(_)
                | PickerState::Confirmed(_)
                | PickerState::Dismissed
        )
    }

    /// 終了時に返した座標
    pub fn result(&self) -> Option<LocationPoint> {
        match self {
            PickerState::Resolved(p) | PickerState::Confirmed(p) => Some(*p),
            _ => None,
        }
    }
}

/// 確認プロンプトへの回答
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    UseCurrent,
    ChooseManually,
}

pub struct LocationPicker {
    state: PickerState,
    services: Arc<dyn LocationServices>,
    notifier: Arc<dyn Notifier>,
    route: Option<LocationReturn>,
}

impl LocationPicker {
    pub fn new(
        services: Arc<dyn LocationServices>,
        notifier: Arc<dyn Notifier>,
        route: LocationReturn,
    ) -> Self {
        Self {
            state: PickerState::Idle,
            services,
            notifier,
            route: Some(route),
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    /// 権限確認と現在地取得（1回の起動につき1度だけ）
    pub async fn activate(&mut self) -> PickerState {
        if self.state != PickerState::Idle {
            debug!(state = ?self.state, "location picker already activated");
            return self.state;
        }

        self.state = PickerState::RequestingPermission;
        if self.services.request_location_permission().await == PermissionStatus::Denied {
            warn!("location permission denied");
            self.notifier.alert(
                "Permission denied",
                "Location permission is required to pick your spot.",
            );
            self.finish(PickerState::Denied);
            return self.state;
        }

        self.state = PickerState::AwaitingFix;
        match self.services.current_position().await {
            Ok(current) => {
                debug!(%current, "current fix obtained");
                self.state = PickerState::ConfirmationPrompt { current };
            }
            Err(e) => {
                warn!(error = %e, "current position unavailable");
                let error = SpotError::Location(e.message);
                self.notifier.alert(error.alert_title(), &error.to_string());
                self.finish(PickerState::FixUnavailable);
            }
        }
        self.state
    }

    /// 「この場所にいますか？」への回答
    pub fn answer(&mut self, answer: PromptAnswer) -> Option<LocationPoint> {
        let PickerState::ConfirmationPrompt { current } = self.state else {
            return None;
        };

        match answer {
            PromptAnswer::UseCurrent => {
                self.finish(PickerState::Resolved(current));
                Some(current)
            }
            PromptAnswer::ChooseManually => {
                self.state = PickerState::AwaitingTap { center: current, selected: None };
                None
            }
        }
    }

    /// 地図タップ（確定前なら何度でも上書き）
    pub fn tap(&mut self, point: LocationPoint) -> bool {
        match &mut self.state {
            PickerState::AwaitingTap { selected, .. } => {
                *selected = Some(point);
                true
            }
            _ => false,
        }
    }

    /// 直前のタップ地点で確定（未選択なら何もしない）
    pub fn confirm(&mut self) -> Option<LocationPoint> {
        let PickerState::AwaitingTap { selected: Some(point), .. } = self.state else {
            return None;
        };
        self.finish(PickerState::Confirmed(point));
        Some(point)
    }

    /// 確定せずに閉じる
    pub fn dismiss(mut self) {
        if !self.state.is_terminal() {
            self.finish(PickerState::Dismissed);
        }
    }

    fn finish(&mut self, state: PickerState) {
        self.state = state;
        let route = self.route.take();
        match (state.result(), route) {
            (Some(point), Some(route)) => {
                info!(%point, "location selected");
                route.send(point);
            }
            _ => debug!(state = ?state, "location picker closed without a coordinate"),
        }
    }
}
