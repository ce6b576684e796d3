use crate::collector::IncrementalCollector;
use archive::{ResultStore, WriteSummary};
use boardwatch_core::{CoreError, ErrorReporter, Rule};
use extractor::{fan_out, parsers_for_rule};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of one board's pass through collect, extract and archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub board: String,
    pub collected: usize,
    pub matched: usize,
    pub archive: WriteSummary,
}

/// Everything one board needs for a cycle. Shared by all board tasks.
pub struct BoardPipeline {
    collector: IncrementalCollector,
    results: ResultStore,
    reporter: ErrorReporter,
}

impl BoardPipeline {
    pub fn new(collector: IncrementalCollector, results: ResultStore) -> Self {
        Self {
            collector,
            results,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Run the rule's board through the pipeline.
    ///
    /// Collection failures end the board's cycle and are returned. Article
    /// write failures are reported one by one and only counted.
    pub async fn run(
        &self,
        rule: &Rule,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, CoreError> {
        let board = rule.board.as_str();
        let collection = self.collector.collect(board, cancel).await?;

        let mut report = PipelineReport {
            board: board.to_string(),
            collected: collection.posts.len(),
            ..Default::default()
        };
        if collection.is_empty() {
            debug!(board, "No new posts");
            return Ok(report);
        }

        let parsers = parsers_for_rule(rule);
        let articles = fan_out(board, parsers, Arc::from(collection.posts)).await;
        report.matched = articles.len();
        report.archive = self.results.write_all(&articles, &self.reporter).await;

        info!(
            board,
            collected = report.collected,
            matched = report.matched,
            written = report.archive.written,
            failed = report.archive.failed,
            "Board pipeline finished"
        );
        Ok(report)
    }
}
