use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use spot_share::catalog::{CatalogState, CategoryCatalog};
use spot_share::cli::{Cli, Commands};
use spot_share::config::Config;
use spot_share::media::FsImageSource;
use spot_share::memory::MemoryBackend;
use spot_share::remote::SupabaseClient;
use spot_share::services::{LocalImage, MediaStore, PersistenceService, Services};
use spot_share::terminal::TerminalDevice;
use spot_share::{AddSpotWorkflow, SpotError, WorkflowSettings};
use spot_share_common::{format_category_label, join_tags, CategoryId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info,spot_share=debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// 永続化とメディアストアを選ぶ
fn backend(
    config: &Config,
    offline: bool,
) -> anyhow::Result<(Arc<dyn PersistenceService>, Arc<dyn MediaStore>)> {
    if offline {
        let memory = Arc::new(MemoryBackend::sample());
        let persistence: Arc<dyn PersistenceService> = memory.clone();
        let store: Arc<dyn MediaStore> = memory;
        return Ok((persistence, store));
    }
    let client = Arc::new(SupabaseClient::from_config(config).context("バックエンドに接続できません")?);
    let persistence: Arc<dyn PersistenceService> = client.clone();
    let store: Arc<dyn MediaStore> = client;
    Ok((persistence, store))
}

struct AddArgs {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    image: Option<PathBuf>,
    lat: Option<String>,
    lon: Option<String>,
    no_prompt: bool,
}

async fn run_add(config: &Config, offline: bool, args: AddArgs) -> anyhow::Result<()> {
    println!("📍 spot-share - スポット投稿\n");

    let (persistence, media_store) = backend(config, offline)?;
    let device = Arc::new(TerminalDevice::new(config.device_location));
    let services = Services {
        persistence,
        media_store,
        location: device.clone(),
        media_device: device.clone(),
        images: Arc::new(FsImageSource),
        notifier: device.clone(),
    };
    let mut workflow = AddSpotWorkflow::new(services, WorkflowSettings::from(config));

    {
        let draft = workflow.draft_mut();
        if let Some(title) = args.title {
            draft.set_title(title);
        }
        if let Some(description) = args.description {
            draft.set_description(description);
        }
        if let Some(tags) = args.tags {
            draft.set_tags(tags);
        }
        if let Some(image) = args.image {
            draft.set_local_image(Some(LocalImage::new(image.display().to_string())));
        }
    }
    if let (Some(lat), Some(lon)) = (args.lat.as_deref(), args.lon.as_deref()) {
        if let Err(e) = workflow.draft_mut().set_manual_coordinate(lat, lon) {
            println!("⚠ {}", e);
        }
    }

    // 1. 入力（カテゴリ取得と並行）
    println!("[1/2] スポット情報を入力");
    let no_prompt = args.no_prompt;
    let loader = workflow.catalog_loader();
    let prompter = device.clone();
    let title = workflow.draft().title().to_string();
    let description = workflow.draft().description().to_string();
    let (catalog, text) = tokio::join!(loader.load(), async move {
        if no_prompt {
            return None;
        }
        tokio::task::spawn_blocking(move || prompt_text_fields(&prompter, &title, &description))
            .await
            .ok()
    });
    workflow.apply_catalog(catalog);
    if let Some((title, description)) = text {
        workflow.draft_mut().set_title(title);
        workflow.draft_mut().set_description(description);
    }
    if let CatalogState::Ready(items) = workflow.categories() {
        println!("✔ {}件のカテゴリ", items.len());
    }

    if let Some(category) = args.category {
        let id = CategoryId::new(category);
        if workflow.categories().is_loaded() && !workflow.categories().contains(&id) {
            println!("⚠ 未知のカテゴリです: {}", id);
        }
        workflow.draft_mut().set_category(Some(id));
    }

    if !args.no_prompt {
        prompt_details(&mut workflow, &device).await;
    }

    // 2. 送信
    println!("\n[2/2] 送信中...");
    loop {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Adding...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = workflow.submit().await;
        spinner.finish_and_clear();

        match result {
            Ok(id) => {
                println!("\n✅ 投稿完了 (id: {})", id);
                return Ok(());
            }
            Err(SpotError::Validation(_)) if !args.no_prompt => {
                prompt_draft(&mut workflow, &device).await;
            }
            Err(e) if !args.no_prompt && device.choose("再送信しますか？", &["はい", "やめる"]) == Some(0) => {
                tracing::debug!(error = %e, "retrying submission");
            }
            Err(e) => {
                workflow.cancel();
                return Err(e.into());
            }
        }
    }
}

/// 対話でドラフトを埋める
async fn prompt_draft(workflow: &mut AddSpotWorkflow, device: &TerminalDevice) {
    let (title, description) =
        prompt_text_fields(device, workflow.draft().title(), workflow.draft().description());
    workflow.draft_mut().set_title(title);
    workflow.draft_mut().set_description(description);
    prompt_details(workflow, device).await;
}

/// タイトルと説明（ドラフトに触れないのでカテゴリ取得中でも入力できる）
fn prompt_text_fields(device: &TerminalDevice, title: &str, description: &str) -> (String, String) {
    let title = device.prompt_text("Title (e.g. Albert Lake Park)", title);
    let description = device.prompt_text("Description", description);
    (title, description)
}

/// カテゴリ以降の項目
async fn prompt_details(workflow: &mut AddSpotWorkflow, device: &TerminalDevice) {
    let items = workflow.categories().items().to_vec();
    if items.is_empty() {
        println!("  カテゴリ一覧がありません（画面を開き直すと再取得します）");
    } else if let Some(id) = device.choose_category(&items) {
        workflow.draft_mut().set_category(Some(id));
    }

    let tags = device.prompt_text("Tags (comma-separated)", workflow.draft().tags());
    workflow.draft_mut().set_tags(tags);

    let current_image = workflow
        .draft()
        .local_image()
        .map(|image| image.uri().to_string())
        .unwrap_or_else(|| "未選択".to_string());
    match device.choose(
        &format!("Image ({})", current_image),
        &["Pick Image", "Take Photo", "そのまま"],
    ) {
        Some(0) => {
            workflow.pick_image().await;
        }
        Some(1) => {
            workflow.capture_image().await;
        }
        _ => {}
    }

    let current_location = workflow
        .draft()
        .coordinate()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "未設定".to_string());
    match device.choose(
        &format!("Location ({})", current_location),
        &["Pick Location on Map", "緯度経度を入力", "そのまま"],
    ) {
        Some(0) => {
            let picker = workflow.open_location_picker();
            device.drive_location_picker(picker).await;
            if let Some(point) = workflow.resume() {
                println!("  位置: {}", point);
            }
        }
        Some(1) => {
            let lat = device.prompt_text("Latitude", "");
            let lon = device.prompt_text("Longitude", "");
            if let Err(e) = workflow.draft_mut().set_manual_coordinate(&lat, &lon) {
                println!("  ⚠ {}", e);
            }
        }
        _ => {}
    }
}

async fn run_list(config: &Config, offline: bool) -> anyhow::Result<()> {
    let (persistence, _) = backend(config, offline)?;
    let spots = persistence.select_spots().await.map_err(SpotError::Persistence)?;

    if spots.is_empty() {
        println!("スポットがありません");
        return Ok(());
    }

    for spot in &spots {
        println!("#{} {} [{}]", spot.id, spot.title, format_category_label(spot.category.as_str()));
        if !spot.description.is_empty() {
            println!("   {}", spot.description);
        }
        if !spot.tags.is_empty() {
            println!("   {}", join_tags(&spot.tags));
        }
        println!("   📍 {}", spot.location);
        if let Some(cover) = spot.cover_image() {
            println!("   🖼  {}", cover);
        }
    }
    println!("\n{}件", spots.len());
    Ok(())
}

async fn run_categories(config: &Config, offline: bool) -> anyhow::Result<()> {
    let (persistence, _) = backend(config, offline)?;
    let items = CategoryCatalog::new(persistence, config.category_rpc.clone())
        .load()
        .await?;

    for item in &items {
        println!("{} ({})", item.label, item.value);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Add { title, description, category, tags, image, lat, lon, no_prompt } => {
            let args = AddArgs { title, description, category, tags, image, lat, lon, no_prompt };
            run_add(&config, cli.offline, args).await?;
        }

        Commands::List => run_list(&config, cli.offline).await?,

        Commands::Categories => run_categories(&config, cli.offline).await?,

        Commands::Config { set_url, set_api_key, show } => {
            let mut config = config;

            if let Some(url) = set_url {
                config.set_project_url(url)?;
                println!("✔ 接続先URLを設定しました");
            }

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  接続先: {}", config.project_url.as_deref().unwrap_or("未設定"));
                println!("  テーブル: {}", config.spots_table);
                println!("  画像バケット: {}", config.image_bucket);
                println!("  カテゴリRPC: {}", config.category_rpc);
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
                if let Some(location) = config.device_location {
                    println!("  端末位置: {}", location);
                }
            }
        }
    }

    Ok(())
}
