use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use skimmer_core::{
    CheckStatus, EnvSettings, FileSettings, FileStore, LayeredSettings, PipelineEvent, ProviderKind,
    SettingsSource, Summarizer, SummaryError, VideoId, build_http_client, format_summary_readable,
    pipeline::DEFAULT_TIMEOUT,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "skimmer")]
#[command(about = "Summarize YouTube videos from their captions with a cascade of AI providers")]
struct Cli {
    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a video by URL or id
    Summarize {
        /// Video URL or 11-character id
        video: String,

        /// 2-3 sentence paragraph instead of the structured summary
        #[arg(long)]
        plain: bool,

        /// Drop any cached summary for this video first
        #[arg(long)]
        no_cache: bool,

        /// Print JSON instead of readable text
        #[arg(long)]
        json: bool,
    },
    /// Inspect or clear cached summaries
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Send a sample prompt to every provider
    TestProviders {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    Stats,
    Clear,
    Delete { video: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(template);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Mirrors pipeline events into the spinner message until the channel closes or the task is aborted.
fn follow_events(
    mut events: broadcast::Receiver<PipelineEvent>,
    spinner: ProgressBar,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                PipelineEvent::TranscriptFetched { available, source, .. } => {
                    let line = if available {
                        format!("Transcript found {}", style(format!("({source})")).dim())
                    } else {
                        format!("No transcript {}", style("(using metadata)").dim())
                    };
                    spinner.println(format!("{} {}", style("✓").green().bold(), line));
                }
                PipelineEvent::ProviderAttempt { provider, .. } => {
                    spinner.set_message(format!(
                        "Generating summary with {}...",
                        provider.display_name()
                    ));
                }
                PipelineEvent::ProviderFailed {
                    provider, error, ..
                } => {
                    spinner.println(format!(
                        "{} {} {}",
                        style("✗").yellow().bold(),
                        provider.display_name(),
                        style(error).dim()
                    ));
                }
                _ => {}
            }
        }
    })
}

fn parse_video(input: &str) -> Result<VideoId> {
    VideoId::parse(input).with_context(|| format!("not a YouTube video URL or id: {input}"))
}

fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", style("Error:").red().bold(), err);

    let needs_setup = err
        .downcast_ref::<SummaryError>()
        .is_some_and(SummaryError::needs_setup);
    if needs_setup {
        eprintln!(
            "\n{} set GEMINI_API_KEY, OPENROUTER_API_KEY, DEEPSEEK_API_KEY or OLLAMA_BASE_URL (usually {}),\n      or add keys to {}",
            style("Hint:").cyan().bold(),
            ProviderKind::Local.config().api_url,
            style(FileSettings::default_path().display()).cyan()
        );
    }
}

async fn summarize(
    summarizer: &Summarizer,
    video: &VideoId,
    plain: bool,
    no_cache: bool,
    json: bool,
) -> Result<()> {
    if no_cache {
        summarizer.delete_cached(video).await;
    }

    let started = Instant::now();
    let spinner = create_spinner(&format!("Fetching transcript for {video}..."));
    let follower = follow_events(summarizer.notifier().subscribe(), spinner.clone());

    let outcome = if plain {
        summarizer.request_plain_summary(video).await.map(|summary| {
            let as_json = serde_json::to_string_pretty(&summary);
            (summary.provider, as_json, summary.summary, false)
        })
    } else {
        summarizer.request_summary(video).await.map(|result| {
            let as_json = serde_json::to_string_pretty(&result);
            let readable = format_summary_readable(&result);
            (result.provider, as_json, readable, result.from_cache)
        })
    };
    follower.abort();

    let (provider, as_json, readable, from_cache) = match outcome {
        Ok(parts) => parts,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    let timing = if from_cache {
        "(cached)".to_string()
    } else {
        format!("[{}]", format_duration(started.elapsed()))
    };
    spinner.finish_with_message(format!(
        "{} Summary generated ({}) {}",
        style("✓").green().bold(),
        provider.display_name(),
        style(timing).dim()
    ));
    eprintln!("{}", style("─".repeat(60)).dim());

    if json {
        println!("{}", as_json.context("failed to serialize summary")?);
    } else {
        println!("{readable}");
    }

    Ok(())
}

async fn cache_command(summarizer: &Summarizer, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Stats => {
            let stats = summarizer.cache_stats().await;
            println!(
                "{} {} entries: {} valid, {} expired",
                style("Cache:").dim(),
                style(stats.total).cyan().bold(),
                stats.valid,
                stats.expired
            );
            println!(
                "{} {}",
                style("Location:").dim(),
                style(FileStore::default_root().display()).cyan()
            );
        }
        CacheAction::Clear => {
            let removed = summarizer.clear_cache().await;
            println!(
                "{} Removed {} cached summaries",
                style("✓").green().bold(),
                removed
            );
        }
        CacheAction::Delete { video } => {
            let video = parse_video(&video)?;
            summarizer.delete_cached(&video).await;
            println!("{} Removed {}", style("✓").green().bold(), video);
        }
    }

    Ok(())
}

async fn test_providers(summarizer: &Summarizer, json: bool) -> Result<()> {
    let spinner = create_spinner("Testing providers...");
    let checks = summarizer.test_providers().await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
        return Ok(());
    }

    for check in &checks {
        let name = check.provider.display_name();
        match check.status {
            CheckStatus::Ok => println!(
                "{} {}  {}",
                style("✓").green().bold(),
                name,
                style(check.summary.as_deref().unwrap_or_default()).dim()
            ),
            CheckStatus::NotConfigured => {
                println!("{} {}  {}", style("-").dim(), name, style("not configured").dim())
            }
            CheckStatus::Failed => println!(
                "{} {}  {}",
                style("✗").red().bold(),
                name,
                check.error.as_deref().unwrap_or_default()
            ),
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let http = build_http_client(Duration::from_secs(cli.timeout))
        .context("failed to build HTTP client")?;
    let settings: Arc<dyn SettingsSource> = Arc::new(LayeredSettings::new(vec![
        Arc::new(FileSettings::new(FileSettings::default_path())),
        Arc::new(EnvSettings),
    ]));
    let summarizer = Summarizer::new(
        http,
        settings,
        Arc::new(FileStore::new(FileStore::default_root())),
    );

    match cli.command {
        Command::Summarize {
            video,
            plain,
            no_cache,
            json,
        } => {
            let video = parse_video(&video)?;
            summarize(&summarizer, &video, plain, no_cache, json).await
        }
        Command::Cache { action } => cache_command(&summarizer, action).await,
        Command::TestProviders { json } => test_providers(&summarizer, json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        print_error(&e);
        std::process::exit(1);
    }
}
