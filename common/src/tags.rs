//! タグ文字列の分割

/// カンマ区切りのタグ入力を順序付きリストへ変換
///
/// 前後の空白は除去し、空のタグは捨てる。
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// 一覧表示用にタグを連結
pub fn join_tags(tags: &[String]) -> String {
    tags.join(" • ")
}
