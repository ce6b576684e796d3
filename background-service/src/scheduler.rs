use crate::pipeline::BoardPipeline;
use boardwatch_core::{load_rules, CoreError, ErrorExt, ErrorRecovery, FailureContext, Rule};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Running,
    Terminated,
}

/// Boards with a pipeline currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlightBoards {
    boards: Arc<Mutex<HashSet<String>>>,
}

impl InFlightBoards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the board busy, or `None` if it already is.
    pub fn try_claim(&self, board: &str) -> Option<InFlightGuard> {
        let mut boards = self.boards.lock().unwrap_or_else(PoisonError::into_inner);
        if !boards.insert(board.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            boards: Arc::clone(&self.boards),
            board: board.to_string(),
        })
    }

    pub fn contains(&self, board: &str) -> bool {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(board)
    }

    pub fn len(&self) -> usize {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the board when the pipeline holding it finishes, panics included.
#[derive(Debug)]
pub struct InFlightGuard {
    boards: Arc<Mutex<HashSet<String>>>,
    board: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.board);
    }
}

/// Fold rules naming the same board into one, in order of first appearance.
pub fn merge_rules(rules: Vec<Rule>) -> Vec<Rule> {
    let mut merged: Vec<Rule> = Vec::new();
    for rule in rules {
        match merged.iter_mut().find(|existing| existing.board == rule.board) {
            Some(existing) => existing.absorb(rule),
            None => merged.push(rule),
        }
    }
    merged
}

/// Fires a crawl cycle at startup and then once per period until cancelled.
pub struct BackgroundService {
    pipeline: Arc<BoardPipeline>,
    rule_path: PathBuf,
    crawl_period: Duration,
    rules: Mutex<Vec<Rule>>,
    in_flight: InFlightBoards,
    tracker: TaskTracker,
    cancel: CancellationToken,
    state: Mutex<ServiceState>,
}

impl BackgroundService {
    pub fn new(
        pipeline: BoardPipeline,
        rule_path: impl Into<PathBuf>,
        crawl_period: Duration,
        initial_rules: Vec<Rule>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            rule_path: rule_path.into(),
            crawl_period,
            rules: Mutex::new(initial_rules),
            in_flight: InFlightBoards::new(),
            tracker: TaskTracker::new(),
            cancel,
            state: Mutex::new(ServiceState::Idle),
        }
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn in_flight(&self) -> &InFlightBoards {
        &self.in_flight
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop starting new cycles. Running pipelines finish on their own.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.cancel.cancel();
    }

    /// Tick until cancelled, then wait for the pipelines still running.
    pub async fn run(&self) {
        info!(
            period_secs = self.crawl_period.as_secs(),
            rules = %self.rule_path.display(),
            "Background service started"
        );

        let mut ticker = tokio::time::interval(self.crawl_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                // The first tick completes immediately
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        self.drain().await;
    }

    /// One cycle, then wait for every pipeline it started.
    pub async fn run_once(&self) {
        self.run_cycle().await;
        self.drain().await;
    }

    /// Reload rules and start one pipeline task per board that is not busy.
    /// Returns the boards that were dispatched.
    pub async fn run_cycle(&self) -> Vec<String> {
        self.set_state(ServiceState::Running);

        let rules = merge_rules(self.reload_rules().await);
        let mut dispatched = Vec::new();
        for rule in rules {
            let Some(guard) = self.in_flight.try_claim(&rule.board) else {
                warn!(board = %rule.board, "Previous pipeline still running, skipping board this cycle");
                continue;
            };

            dispatched.push(rule.board.clone());
            let pipeline = Arc::clone(&self.pipeline);
            let cancel = self.cancel.clone();
            self.tracker.spawn(async move {
                let _guard = guard;
                run_board(&pipeline, &rule, &cancel).await;
            });
        }

        debug!(boards = dispatched.len(), "Cycle dispatched");
        self.set_state(ServiceState::Idle);
        dispatched
    }

    /// Read the rule file, falling back to the last good rule set.
    ///
    /// The file is read on the blocking pool so a slow disk never stalls
    /// the tick loop.
    pub async fn reload_rules(&self) -> Vec<Rule> {
        let path = self.rule_path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_rules(path)).await;

        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        match loaded {
            Ok(Ok(loaded)) => {
                debug!(rules = loaded.len(), "Loaded rules");
                *rules = loaded;
            }
            Ok(Err(e)) => {
                ErrorRecovery::handle(
                    self.pipeline.reporter(),
                    &CoreError::Config(e),
                    FailureContext::RuleReload,
                );
                warn!(rules = rules.len(), "Keeping previous rules");
            }
            Err(e) => {
                error!("Rule loader task failed: {}", e);
                warn!(rules = rules.len(), "Keeping previous rules");
            }
        }
        rules.clone()
    }

    async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.set_state(ServiceState::Terminated);
        info!("Background service stopped");
    }

    fn set_state(&self, state: ServiceState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

async fn run_board(pipeline: &BoardPipeline, rule: &Rule, cancel: &CancellationToken) {
    match pipeline.run(rule, cancel).await {
        Ok(_) => {}
        Err(CoreError::Cancelled { operation }) => {
            info!(board = %rule.board, %operation, "Board abandoned for shutdown");
        }
        Err(e) => {
            ErrorRecovery::handle(pipeline.reporter(), &e, FailureContext::BoardWalk);
            if e.is_transient() {
                debug!(board = %rule.board, "Will retry next cycle");
            }
        }
    }
}
