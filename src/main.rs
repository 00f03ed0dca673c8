use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commentlens::analysis::LogReporter;
use commentlens::{
    api, build_source, AnalyzeParams, CommentCleaner, CommentPipeline, CommentStore, Config,
    CrawlMode, CrawlParams, PipelineConfig, ResultSummary, TaskOrchestrator, TaskRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "commentlens")]
#[command(version = "0.1.0")]
#[command(about = "Crawl, clean and analyze video comments")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP task API
    Serve {
        /// Address to bind (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,

        /// Directory for comment files (overrides DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// live, synthetic or live-with-fallback (overrides CRAWL_MODE)
        #[arg(long)]
        crawl_mode: Option<CrawlMode>,
    },

    /// Crawl, clean and analyze one resource in the foreground
    Run {
        /// Video id (BV... or av...)
        resource_id: String,

        /// Maximum comments to fetch
        #[arg(long, default_value = "10000")]
        max_comments: usize,

        /// Analyzer: default, openai or other
        #[arg(short, long, default_value = "default")]
        model: String,

        /// API key for a remote analyzer
        #[arg(long)]
        api_key: Option<String>,

        /// live, synthetic or live-with-fallback (overrides CRAWL_MODE)
        #[arg(long)]
        crawl_mode: Option<CrawlMode>,
    },

    /// Clean a raw comment file
    Clean {
        file: PathBuf,
    },

    /// Print the classification histogram of an analyzed file
    Results {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("commentlens=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    match args.command {
        Command::Serve {
            bind,
            data_dir,
            crawl_mode,
        } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(mode) = crawl_mode {
                config.crawl_mode = mode;
            }
            serve(config).await?;
        }
        Command::Run {
            resource_id,
            max_comments,
            model,
            api_key,
            crawl_mode,
        } => {
            if let Some(mode) = crawl_mode {
                config.crawl_mode = mode;
            }
            run(config, resource_id, max_comments, model, api_key).await?;
        }
        Command::Clean { file } => {
            let store = CommentStore::new(&config.data_dir);
            let outcome = CommentCleaner::new().process_file(&store, &file)?;
            println!(
                "{} comment(s) kept, {} malformed line(s) skipped -> {}",
                outcome.cleaned_count,
                outcome.skipped,
                outcome.output_path.display()
            );
        }
        Command::Results { file } => {
            let store = CommentStore::new(&config.data_dir);
            let summary = ResultSummary::from_file(&store, &file)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config, show_progress: bool) -> anyhow::Result<CommentPipeline> {
    let source = build_source(
        config.crawl_mode,
        Duration::from_millis(config.crawl_page_delay_ms),
    )?;
    let mut pipeline_config = PipelineConfig::from(config);
    pipeline_config.show_progress = show_progress;
    Ok(CommentPipeline::new(source, pipeline_config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config, false)?;
    let orchestrator = TaskOrchestrator::new(TaskRegistry::new(), Arc::new(pipeline));

    tracing::info!(
        "Starting server on {} (data dir: {}, crawl mode: {:?})",
        config.bind_addr,
        config.data_dir.display(),
        config.crawl_mode
    );
    api::serve(&config.bind_addr, orchestrator).await?;
    Ok(())
}

async fn run(
    config: Config,
    resource_id: String,
    max_comments: usize,
    model: String,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config, true)?;

    tracing::info!("Crawling comments for {}", resource_id);
    let crawled = pipeline
        .crawl(
            &CrawlParams {
                resource_id,
                max_comments,
            },
            &LogReporter,
        )
        .await?;
    println!(
        "Crawled {} comment(s) ({:?}), {} kept after cleaning",
        crawled.comment_count, crawled.origin, crawled.cleaned_count
    );

    let analyzed = pipeline
        .analyze(
            &AnalyzeParams {
                file_path: PathBuf::from(&crawled.file_path),
                api_key,
                model,
            },
            &LogReporter,
        )
        .await?;

    let summary = ResultSummary::from_file(pipeline.store(), &PathBuf::from(&analyzed.result_file))?;
    let h = &summary.classifications;
    println!("\n=== Results: {} ===\n", analyzed.result_file);
    println!("  excellent: {}", h.excellent);
    println!("  good:      {}", h.good);
    println!("  neutral:   {}", h.neutral);
    println!("  poor:      {}", h.poor);
    println!("  unclear:   {}", h.unclear);
    println!("  total:     {}", summary.total);

    if !summary.sample_summaries.is_empty() {
        println!("\nSample summaries:");
        for s in &summary.sample_summaries {
            println!("  - {}", s);
        }
    }

    Ok(())
}
