use archive::{CursorStore, ResultStore};
use background_service::{BackgroundService, BoardPipeline, IncrementalCollector};
use board_client::{PageWalker, PttBoardSource};
use boardwatch_core::{
    load_rules, Config, CoreError, ErrorRecovery, ErrorReporter, FailureContext,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "boardwatch=info,background_service=info,board_client=info,archive=info,extractor=info,viewer=info";

/// Watch discussion boards for keywords and archive the matching posts.
#[derive(Debug, Parser)]
#[command(name = "boardwatch", version)]
struct Args {
    /// Configuration file (.toml or .json)
    #[arg(short, long, default_value = "./config.json")]
    config: PathBuf,

    /// Run a single crawl cycle, wait for it, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    tracing::info!(config = %args.config.display(), "Starting boardwatch");

    let reporter = ErrorReporter::new();
    let config = startup(&reporter, Config::load(&args.config).map_err(CoreError::from))?;
    let rules = startup(&reporter, load_rules(&config.rule_path).map_err(CoreError::from))?;
    let source = startup(
        &reporter,
        PttBoardSource::new(
            &config.board_base_url,
            &config.user_agent,
            config.requests_per_minute,
        )
        .map_err(CoreError::from),
    )?;
    tracing::info!(rules = rules.len(), base_url = %config.board_base_url, "Configuration loaded");

    let collector = IncrementalCollector::new(
        PageWalker::new(Arc::new(source)),
        CursorStore::new(&config.status_path),
    )
    .with_page_delay(config.page_delay())
    .with_cursor_depth(config.cursor_depth);
    let results = ResultStore::new(&config.result_path);
    let pipeline = BoardPipeline::new(collector, results.clone()).with_reporter(reporter);

    let cancel = CancellationToken::new();
    let service = BackgroundService::new(
        pipeline,
        &config.rule_path,
        config.crawl_period(),
        rules,
        cancel.clone(),
    );

    if args.once {
        service.run_once().await;
        return Ok(());
    }

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind viewer on {}: {}", addr, e))?;
    let viewer_shutdown = cancel.clone();
    let viewer_task = tokio::spawn(viewer::serve(listener, results, async move {
        viewer_shutdown.cancelled().await
    }));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, finishing running pipelines");
                signal_cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    service.run().await;

    match viewer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Viewer error: {}", e),
        Err(e) => tracing::error!("Viewer task failed: {}", e),
    }
    tracing::info!("boardwatch stopped");
    Ok(())
}

/// Startup errors are fatal: report them and stop.
fn startup<T>(reporter: &ErrorReporter, result: Result<T, CoreError>) -> anyhow::Result<T> {
    result.map_err(|e| {
        ErrorRecovery::handle(reporter, &e, FailureContext::Startup);
        anyhow::Error::new(e)
    })
}
