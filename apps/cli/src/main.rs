use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubescope_core::{
    AnalysisRequest, AnalysisService, AppConfig, Provider, TranscriptService, VideoInfoClient,
    extract_video_id, format_report_readable, format_transcript_with_timestamps, load_report,
    report_path, save_report,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubescope")]
#[command(about = "Fetch a YouTube transcript and generate an AI-powered teaching-quality report")]
struct Cli {
    /// Video URL or 11-character video id
    url: String,

    /// Preferred transcript language (e.g. "hi", "en"). Defaults to DEFAULT_TRANSCRIPT_LANGUAGE.
    #[arg(short, long)]
    lang: Option<String>,

    /// AI provider for the analysis. Defaults to LLM_PROVIDER.
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Print the report as JSON instead of the readable form
    #[arg(long)]
    json: bool,

    /// Print the timestamped transcript before the report
    #[arg(long)]
    show_transcript: bool,

    /// Don't write the report to the cache directory
    #[arg(long)]
    no_save: bool,

    /// Ignore a previously saved report
    #[arg(short, long)]
    force: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Where banners and progress lines go. With `--json` stdout carries
/// nothing but the report.
fn decoration(json: bool) -> Term {
    if json {
        Term::stderr()
    } else {
        Term::stdout()
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::from_env().context("invalid configuration")?;

    // Validate API key early
    if let Some(provider) = cli.provider {
        let provider: Provider = provider.into();
        config.llm.provider = provider;
        config.llm.api_key = match provider.validate_api_key() {
            Ok(key) => Some(key),
            Err(e) => fail(e),
        };
    } else if config.llm.api_key.is_none() {
        fail(format!(
            "Missing API key: {} environment variable is not set",
            config.llm.provider.config().env_var
        ));
    }
    let provider = config.llm.provider;

    let Some(video_id) = extract_video_id(&cli.url) else {
        fail(format!("Not a YouTube video URL or id: {}", cli.url));
    };
    let lang = cli
        .lang
        .unwrap_or_else(|| config.transcript.default_language.clone());

    let out = decoration(cli.json);
    out.write_line(&format!(
        "\n{}  {}\n",
        style("tubescope").cyan().bold(),
        style("Video Analyzer").dim()
    ))?;
    out.write_line(&style("─".repeat(60)).dim().to_string())?;

    let total_start = Instant::now();
    let saved_path = report_path(&video_id, provider, &lang);

    let report = if !cli.force && saved_path.exists() {
        let report = load_report(&saved_path).await?;
        out.write_line(&format!(
            "{} Report generated ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style("(cached)").dim()
        ))?;
        report
    } else {
        // Step 1: Transcript
        let step_start = Instant::now();
        let transcripts = TranscriptService::from_config(&config)?;
        let video_info = VideoInfoClient::new(config.request_timeout)?;
        let spinner = create_spinner(&format!("Fetching {} transcript...", lang));
        let (transcript, title) = tokio::join!(
            transcripts.fetch(&video_id, &lang),
            video_info.title(&video_id)
        );
        let transcript = match transcript {
            Ok(transcript) => transcript,
            Err(e) => {
                spinner.finish_and_clear();
                for attempt in e.attempts() {
                    eprintln!("  {} {}", style("✗").red(), style(attempt).dim());
                }
                fail(e);
            }
        };
        spinner.finish_with_message(format!(
            "{} Transcript: {:.1} min, {} via {} {}",
            style("✓").green().bold(),
            transcript.duration_seconds() / 60.0,
            style(&transcript.language_used).yellow(),
            transcript.source,
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));

        if let Some(title) = &title {
            out.write_line(&format!("{} {}", style("Title:").dim(), style(title).bold()))?;
        }
        if cli.show_transcript {
            out.write_line(&format_transcript_with_timestamps(&transcript.segments))?;
        }

        // Step 2: Analysis
        let step_start = Instant::now();
        let analysis = AnalysisService::from_config(&config)?;
        let spinner = create_spinner(&format!("Analyzing with {}...", provider.name()));
        let text = transcript.text();
        let outcome = analysis
            .analyze(AnalysisRequest {
                transcript: &text,
                video_id: &video_id,
                video_title: title.as_deref(),
            })
            .await;
        let mut report = match outcome {
            Ok(analysis) => analysis.result,
            Err(e) => {
                spinner.finish_and_clear();
                fail(e);
            }
        };
        spinner.finish_with_message(format!(
            "{} Report generated ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));

        if let Some(title) = title {
            report.set_video_title(title);
        }

        if !cli.no_save {
            save_report(&report, &saved_path).await?;
            out.write_line(&format!(
                "{} {}",
                style("Saved:").dim(),
                style(saved_path.display()).cyan()
            ))?;
        }
        report
    };

    out.write_line(&format!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    ))?;
    out.write_line(&style("─".repeat(60)).dim().to_string())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report_readable(&report));
    }

    Ok(())
}
