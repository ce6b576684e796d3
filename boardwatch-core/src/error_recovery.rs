//! Failure isolation for the crawl pipeline.
//!
//! Nothing is retried inside a cycle. Every error is mapped to the smallest
//! unit of work it has to abandon, and the next scheduled cycle acts as the
//! retry.

use crate::{CoreError, ErrorExt, ErrorReporter};

/// Where in the process lifetime an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureContext {
    /// Loading configuration and rules before the scheduler starts
    Startup,
    /// Reloading rules at the start of a cycle
    RuleReload,
    /// Walking a board or touching its cursor
    BoardWalk,
    /// Persisting one extracted article
    ArticleWrite,
}

/// What the caller gives up on after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Abandon this board for the current cycle; its cursor stays untouched
    SkipBoard,
    /// Drop this article; siblings, other boards and other rules continue
    SkipArticle,
    /// Keep running with the rule set from the previous cycle
    KeepPreviousRules,
    /// Stop the process
    Fail,
}

impl RecoveryStrategy {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecoveryStrategy::Fail)
    }
}

pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine what has to be abandoned for a given error.
    pub fn determine_strategy(error: &CoreError, context: FailureContext) -> RecoveryStrategy {
        match (context, error) {
            // Without a valid config or rule file there is nothing to run
            (FailureContext::Startup, _) => RecoveryStrategy::Fail,

            (FailureContext::RuleReload, _) => RecoveryStrategy::KeepPreviousRules,

            (FailureContext::ArticleWrite, _) => RecoveryStrategy::SkipArticle,

            (FailureContext::BoardWalk, CoreError::Archive(_)) => RecoveryStrategy::SkipArticle,
            (FailureContext::BoardWalk, _) => RecoveryStrategy::SkipBoard,
        }
    }

    /// Report the error at the level its strategy calls for and return the strategy.
    pub fn handle(
        reporter: &ErrorReporter,
        error: &CoreError,
        context: FailureContext,
    ) -> RecoveryStrategy {
        let strategy = Self::determine_strategy(error, context);
        match strategy {
            RecoveryStrategy::Fail | RecoveryStrategy::SkipBoard => reporter.report_error(error),
            RecoveryStrategy::SkipArticle | RecoveryStrategy::KeepPreviousRules => {
                reporter.report_warning(error)
            }
        }
        tracing::debug!(
            code = %error.error_code(),
            ?context,
            ?strategy,
            "Applied recovery strategy"
        );
        strategy
    }
}
