mod repl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use framewatch_core::config::AppConfig;
use framewatch_core::types::MediaSource;
use framewatch_engine::encoder::encode_jpeg_data_uri;
use framewatch_engine::session::CaptureController;
use framewatch_engine::sink::StdoutSink;
use framewatch_engine::traits::{MediaBackend, VideoFrame};
use framewatch_platform::NativeOptions;
use framewatch_providers::process_frame::AnalysisRequest;
use framewatch_runtime::analyzer::HttpFrameAnalyzer;
use framewatch_runtime::config_store::ConfigStore;
use framewatch_runtime::defaults::default_config_path;
use framewatch_runtime::runtime_engine::{
    build_controller_from_config, hydrate_credential, persist_settings,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use repl::{HELP, ReplCommand, SettingsForm, parse_line};

#[derive(Parser, Debug)]
#[command(name = "framewatch", version, about = "Periodic frame capture and remote analysis")]
struct Cli {
    /// Config file (defaults to the per-user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analysis server base URL for this run.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive capture session driven from stdin.
    Watch {
        #[arg(long)]
        source: Option<MediaSource>,

        /// Start capturing as soon as the source is bound.
        #[arg(long)]
        start: bool,

        /// Use generated frames instead of real devices.
        #[arg(long)]
        synthetic: bool,

        /// Camera device index.
        #[arg(long, default_value_t = 0)]
        camera_index: u32,

        /// Share the first window whose app name or title contains this text.
        #[arg(long)]
        window: Option<String>,
    },

    /// Send one still image for analysis and print the response.
    Analyze { image: PathBuf },

    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,

    /// Unset flags keep their current value.
    Save {
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        /// Access credential; pass an empty string to clear it.
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = ConfigStore::at_path(cli.config.clone().unwrap_or_else(default_config_path));
    let mut cfg = store.load_or_default()?;
    hydrate_credential(&mut cfg);
    if let Some(endpoint) = &cli.endpoint {
        cfg.endpoint.base_url = endpoint.clone();
    }
    log::debug!("config: {}", store.path().display());

    match cli.command {
        Command::Watch {
            source,
            start,
            synthetic,
            camera_index,
            window,
        } => {
            let backend: Arc<dyn MediaBackend> = if synthetic {
                Arc::new(framewatch_platform::synthetic_backend(640, 480))
            } else {
                Arc::new(framewatch_platform::native_backend(&NativeOptions {
                    camera_index,
                    window_filter: window,
                }))
            };
            watch(store, cfg, backend, source, start).await
        }
        Command::Analyze { image } => analyze(&cfg, &image).await,
        Command::Settings { action } => settings(&store, cfg, action),
    }
}

async fn watch(
    store: ConfigStore,
    mut cfg: AppConfig,
    backend: Arc<dyn MediaBackend>,
    source: Option<MediaSource>,
    start: bool,
) -> anyhow::Result<()> {
    let controller = build_controller_from_config(&cfg, backend, Arc::new(StdoutSink))?;
    let mut form = SettingsForm::from_settings(&cfg.settings);

    if let Some(source) = source {
        // Failures are already reported on the sink.
        if controller.select_source(source).await.is_ok() && start {
            let _ = controller.start().await;
        }
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let cmd = match parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };

        match cmd {
            ReplCommand::Select(source) => {
                let _ = controller.select_source(source).await;
            }
            ReplCommand::Start => {
                let _ = controller.start().await;
            }
            ReplCommand::Stop => {
                controller.stop().await;
            }
            ReplCommand::Status => print_status(&controller).await,
            ReplCommand::Mode(mode) => {
                form.select_mode(mode);
                println!("mode: {}\nprompt: {}", form.mode, form.prompt);
            }
            ReplCommand::Prompt(text) => form.prompt = text,
            ReplCommand::Interval(secs) => form.interval = secs,
            ReplCommand::Key(key) => form.key = key,
            ReplCommand::Save => {
                match controller
                    .save_settings(form.mode.as_str(), &form.prompt, &form.interval, &form.key)
                    .await
                {
                    Ok(saved) => {
                        if let Err(e) = persist_settings(&store, &mut cfg, &saved) {
                            log::warn!("settings applied but not persisted: {e:#}");
                        }
                        form = SettingsForm::from_settings(&saved);
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn print_status(controller: &CaptureController) {
    let status = controller.status().await;
    let settings = controller.settings().await;
    println!(
        "state: {:?}\nsource: {}\ngeneration: {}\nmode: {}\ninterval: {}s",
        status.state,
        status
            .active_source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
        status.generation,
        settings.prompt_mode,
        settings.refresh_interval_secs,
    );
}

async fn analyze(cfg: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let img = image::open(path)
        .with_context(|| format!("open image {}", path.display()))?
        .to_rgba8();
    let frame = VideoFrame {
        width: img.width(),
        height: img.height(),
        rgba: img.into_raw(),
    };
    let data_uri = encode_jpeg_data_uri(&frame, cfg.capture.jpeg_quality)?;

    let analyzer = HttpFrameAnalyzer::new(&cfg.endpoint)?;
    let request = AnalysisRequest::new(
        data_uri,
        cfg.settings.prompt_text.clone(),
        cfg.settings.api_key(),
    );
    log::info!("analyzing {} via {}", path.display(), analyzer.endpoint());

    let text = analyzer.analyze_once(&request).await?;
    println!("{text}");
    Ok(())
}

fn settings(store: &ConfigStore, mut cfg: AppConfig, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::Show => {
            let mut shown = cfg.clone();
            shown.settings.credential = None;
            println!("{}", serde_json::to_string_pretty(&shown)?);
            println!("credential: {}", if cfg.settings.api_key().is_some() { "set" } else { "not set" });
        }
        SettingsAction::Save {
            mode,
            prompt,
            interval,
            key,
        } => {
            let current = SettingsForm::from_settings(&cfg.settings);
            let mut next = cfg.settings.clone();
            next.save(
                mode.as_deref().unwrap_or(current.mode.as_str()),
                prompt.as_deref().unwrap_or(&current.prompt),
                interval.as_deref().unwrap_or(&current.interval),
                key.as_deref().unwrap_or(&current.key),
            )?;
            persist_settings(store, &mut cfg, &next)?;
            println!("Settings saved. Using {} analysis mode.", next.prompt_mode);
        }
    }
    Ok(())
}
