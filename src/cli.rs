use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spot-share")]
#[command(about = "ジオタグ付きスポットの投稿・閲覧ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドに接続せずインメモリで動作
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// スポットを投稿
    Add {
        /// タイトル
        #[arg(short, long)]
        title: Option<String>,

        /// 説明
        #[arg(short, long)]
        description: Option<String>,

        /// カテゴリ（列挙値、例: parks_and_reserves）
        #[arg(short, long)]
        category: Option<String>,

        /// タグ（カンマ区切り）
        #[arg(long)]
        tags: Option<String>,

        /// 画像ファイル
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// 緯度
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        /// 経度
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,

        /// 対話入力をせず、指定値だけで送信
        #[arg(long)]
        no_prompt: bool,
    },

    /// スポット一覧を表示
    List,

    /// カテゴリ一覧を表示
    Categories,

    /// 設定を表示/編集
    Config {
        /// 接続先URLを設定
        #[arg(long)]
        set_url: Option<String>,

        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
