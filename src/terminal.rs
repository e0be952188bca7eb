//! 対話端末による端末機能の実装
//!
//! 権限確認は yes/no、現在地は設定の固定座標か手入力、
//! 画像はファイルパス入力で取り込む。

use crate::location::{LocationPicker, PickerState, PromptAnswer};
use crate::media::is_image_extension;
use crate::services::{
    LocalImage, LocationServices, MediaDevice, Notifier, PermissionStatus, ServiceError,
    ServiceResult,
};
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use regex::Regex;
use spot_share_common::{CategoryId, CategoryItem, LocationPoint};
use std::path::Path;

/// `lat, lon` 形式の入力を解釈
pub fn parse_coordinate_input(input: &str) -> Option<LocationPoint> {
    lazy_static::lazy_static! {
        static ref COORD_RE: Regex =
            Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*[,\s]\s*(-?\d+(?:\.\d+)?)\s*$").unwrap();
    }

    let caps = COORD_RE.captures(input)?;
    LocationPoint::parse(&caps[1], &caps[2]).ok()
}

pub struct TerminalDevice {
    device_location: Option<LocationPoint>,
    theme: ColorfulTheme,
}

impl TerminalDevice {
    pub fn new(device_location: Option<LocationPoint>) -> Self {
        Self {
            device_location,
            theme: ColorfulTheme::default(),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn ask(&self, prompt: &str) -> ServiceResult<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ServiceError::new(e.to_string()))
    }

    /// 画像ファイルのパスを尋ねる（空欄はキャンセル）
    fn ask_image_path(&self, prompt: &str) -> ServiceResult<Option<LocalImage>> {
        let answer = self.ask(prompt)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }

        let path = Path::new(answer);
        if !path.is_file() {
            return Err(ServiceError::new(format!("ファイルが見つかりません: {}", answer)));
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        if !is_image_extension(&ext) {
            return Err(ServiceError::new(format!("画像ファイルではありません: {}", answer)));
        }
        Ok(Some(LocalImage::new(answer)))
    }

    pub fn prompt_text(&self, prompt: &str, initial: &str) -> String {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
            .unwrap_or_else(|_| initial.to_string())
    }

    /// カテゴリをピックリストから選ぶ（一覧が空なら `None`）
    pub fn choose_category(&self, items: &[CategoryItem]) -> Option<CategoryId> {
        if items.is_empty() {
            return None;
        }
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        Select::with_theme(&self.theme)
            .with_prompt("Select a category")
            .items(&labels)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
            .map(|index| items[index].value.clone())
    }

    pub fn choose(&self, prompt: &str, items: &[&str]) -> Option<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }

    /// 位置選択画面を対話で操作する
    pub async fn drive_location_picker(&self, mut picker: LocationPicker) -> Option<LocationPoint> {
        let PickerState::ConfirmationPrompt { current } = picker.activate().await else {
            return None;
        };

        let answer = self.choose(
            &format!("Are you at the spot? ({})", current),
            &["Yes, use my current location", "No, select a spot on the map"],
        );
        match answer {
            Some(0) => return picker.answer(PromptAnswer::UseCurrent),
            Some(_) => {
                picker.answer(PromptAnswer::ChooseManually);
            }
            None => {
                picker.dismiss();
                return None;
            }
        }

        loop {
            let input = match self.ask("地図をタップ (lat, lon) / 空欄で確定 / q で中止") {
                Ok(input) => input,
                Err(_) => {
                    picker.dismiss();
                    return None;
                }
            };
            let input = input.trim();

            if input.eq_ignore_ascii_case("q") {
                picker.dismiss();
                return None;
            }
            if input.is_empty() {
                match picker.confirm() {
                    Some(point) => return Some(point),
                    None => {
                        println!("  地点が選ばれていません");
                        continue;
                    }
                }
            }
            match parse_coordinate_input(input) {
                Some(point) => {
                    picker.tap(point);
                    println!("  選択中: {}", point);
                }
                None => println!("  座標の形式が不正です: {}", input),
            }
        }
    }
}

#[async_trait]
impl LocationServices for TerminalDevice {
    async fn request_location_permission(&self) -> PermissionStatus {
        if self.confirm("位置情報へのアクセスを許可しますか？") {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn current_position(&self) -> ServiceResult<LocationPoint> {
        if let Some(point) = self.device_location {
            return Ok(point);
        }
        let answer = self.ask("現在地 (lat, lon)")?;
        parse_coordinate_input(&answer)
            .ok_or_else(|| ServiceError::new(format!("座標の形式が不正です: {}", answer)))
    }
}

#[async_trait]
impl MediaDevice for TerminalDevice {
    async fn pick_from_library(&self) -> ServiceResult<Option<LocalImage>> {
        self.ask_image_path("画像ファイルのパス（空欄でキャンセル）")
    }

    async fn request_camera_permission(&self) -> PermissionStatus {
        if self.confirm("カメラへのアクセスを許可しますか？") {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn capture_from_camera(&self) -> ServiceResult<Option<LocalImage>> {
        self.ask_image_path("撮影した写真のパス（空欄でキャンセル）")
    }
}

impl Notifier for TerminalDevice {
    fn alert(&self, title: &str, message: &str) {
        println!("\n[{}] {}", title, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate_input() {
        let p = parse_coordinate_input("-37.81, 144.96").unwrap();
        assert_eq!(p.latitude(), -37.81);
        assert_eq!(p.longitude(), 144.96);

        assert!(parse_coordinate_input("  10 20 ").is_some());
        assert!(parse_coordinate_input("-37.81,144.96").is_some());
    }

    #[test]
    fn test_parse_coordinate_input_rejects() {
        assert!(parse_coordinate_input("").is_none());
        assert!(parse_coordinate_input("north").is_none());
        assert!(parse_coordinate_input("95, 10").is_none());
        assert!(parse_coordinate_input("1, 2, 3").is_none());
    }
}
