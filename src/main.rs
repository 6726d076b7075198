//! postcraft is a CLI tool that gathers source material for Instagram posts.
//!
//! The tool has four commands:
//! 1. `crawl` - Discovers and extracts the articles of a blog
//! 2. `discover` - Reports how many articles a crawl would find
//! 3. `import` - Parses a Bright Data CSV/JSON export of Instagram posts
//! 4. `summarize` - Crawls a blog and summarizes its articles with an LLM

use std::fs;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use llm::builder::{LLMBackend, LLMBuilder};
use log::{LevelFilter, error, info};
use serde::Serialize;
use url::Url;

use postcraft::{
    BlogCrawler, CrawlOptions, CrawlProgress, constants::MODEL_API_KEY_ENV_NAME,
    discover_sitemap, parse_bright_data_file,
    summarize::{SummarizeContext, build_rate_limiter, summarize_articles},
    upload::read_upload,
};

/// A CLI tool to gather Instagram post material from blogs and exports
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Args)]
struct CrawlArgs {
    /// The blog URL to crawl
    url: String,
    /// Sitemap URL to use instead of probing the usual locations
    #[arg(long)]
    sitemap_url: Option<String>,
    /// Number of articles fetched per batch
    #[arg(long, short, default_value_t = postcraft::constants::CONCURRENCY)]
    concurrency: usize,
    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 15_000)]
    fetch_timeout_ms: u64,
    /// Time budget of the whole crawl in seconds
    #[arg(long, default_value_t = 300)]
    total_timeout_secs: u64,
    /// Maximum number of articles fetched
    #[arg(long, default_value_t = postcraft::constants::MAX_ARTICLES)]
    max_articles: usize,
}

impl From<&CrawlArgs> for CrawlOptions {
    fn from(args: &CrawlArgs) -> Self {
        Self {
            sitemap_url: args.sitemap_url.clone(),
            concurrency: args.concurrency,
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
            total_timeout: Duration::from_secs(args.total_timeout_secs),
            max_articles: args.max_articles,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Discover and extract the articles of a blog
    Crawl {
        #[command(flatten)]
        crawl: CrawlArgs,
        /// Path to write the JSON result to (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Report how many articles a crawl of the blog would find
    Discover {
        /// The blog URL to probe
        url: String,
        /// Sitemap URL to validate instead of probing the usual locations
        #[arg(long)]
        sitemap_url: Option<String>,
    },
    /// Parse a Bright Data CSV or JSON export
    Import {
        /// Path to the .csv or .json file
        file: String,
        /// Path to write the JSON result to (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Crawl a blog and summarize its articles using an LLM model
    Summarize {
        #[command(flatten)]
        crawl: CrawlArgs,
        /// URL of the LLM model to use for processing
        model: String,
        /// Path to the file with a prompt template
        #[arg(long, short = 'p')]
        prompt_file: Option<String>,
        /// Rate limit: requests per minute (default: no limit)
        #[arg(long, short = 'r')]
        rpm: Option<u32>,
        /// Path to write the JSON result to (default: stdout)
        #[arg(long, short)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Command::Crawl { crawl, output } => {
            let crawler = BlogCrawler::new(CrawlOptions::from(&crawl))?;
            let result = crawler.crawl(&crawl.url, Some(&log_progress)).await;
            for message in &result.errors {
                error!("{message}");
            }
            write_json(&result, output.as_deref())
        }
        Command::Discover { url, sitemap_url } => {
            let options = CrawlOptions {
                sitemap_url,
                ..Default::default()
            };
            write_json(&discover_sitemap(&url, &options).await, None)
        }
        Command::Import { file, output } => {
            let result = parse_bright_data_file(&read_upload(&file)?);
            for message in &result.errors {
                error!("{message}");
            }
            write_json(&result, output.as_deref())
        }
        Command::Summarize {
            crawl,
            model,
            prompt_file,
            rpm,
            output,
        } => handle_summarize_command(crawl, model, prompt_file, rpm, output).await,
    }
}

fn log_progress(progress: CrawlProgress) {
    info!(
        "{:?}: {}/{}",
        progress.phase, progress.current, progress.total
    );
}

fn write_json<T: Serialize>(value: &T, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).context(format!("Failed to write output file: {path}"))?;
            info!("Wrote result to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_llm(model: &str) -> Result<LLMBuilder> {
    let model_url = Url::parse(model).map_err(|e| anyhow::anyhow!("Invalid model URL: {}", e))?;
    let llm_builder = LLMBuilder::new()
        .backend(
            LLMBackend::from_str(model_url.scheme())
                .map_err(|e| anyhow::anyhow!("Invalid LLM backend: {}", e))?,
        )
        .model(
            [
                model_url
                    .host_str()
                    .context("Specify model name as host URL.")?,
                model_url.username(),
            ]
            .iter()
            .filter(|x| !x.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(":"),
        );

    Ok(match std::env::var(MODEL_API_KEY_ENV_NAME) {
        Ok(model_key) => {
            info!("API key is provided via {MODEL_API_KEY_ENV_NAME}");
            llm_builder.api_key(model_key)
        }
        Err(err) => {
            info!("{err} while providing api key");
            llm_builder
        }
    })
}

async fn handle_summarize_command(
    crawl: CrawlArgs,
    model: String,
    prompt_file: Option<String>,
    rpm: Option<u32>,
    output: Option<String>,
) -> Result<()> {
    let model = build_llm(&model)?
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build LLM model: {}", e))?;

    let prompt_template = match prompt_file {
        Some(file) => {
            let content =
                fs::read_to_string(&file).context(format!("Failed to read prompt file: {file}"))?;
            Some(content)
        }
        None => None,
    };

    let crawler = BlogCrawler::new(CrawlOptions::from(&crawl))?;
    let result = crawler.crawl(&crawl.url, Some(&log_progress)).await;
    for message in &result.errors {
        error!("{message}");
    }

    let rate_limiter = rpm.and_then(build_rate_limiter);
    let ctx = SummarizeContext {
        model: model.as_ref(),
        prompt_template: prompt_template.as_deref(),
        rate_limiter: rate_limiter.as_ref(),
    };

    let summaries = summarize_articles(&result.posts, &ctx).await?;
    write_json(&summaries, output.as_deref())
}
