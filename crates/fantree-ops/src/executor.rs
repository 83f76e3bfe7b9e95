//! Background operation executor with channel-based completion.

use tokio::sync::mpsc;

use fantree_core::{EngineConfig, Result, TreeReport};

use crate::OPERATION_CHANNEL_SIZE;
use crate::copy::copy_recursive;
use crate::delete::delete_folder_recursive;
use crate::deltree::{Deltree, deltree};
use crate::facade::FileOps;
use crate::mkdir::make_dirs;
use crate::operation::{OperationComplete, TreeOperation};

/// Event sent while an operation runs.
#[derive(Debug)]
pub enum OperationEvent {
    /// The operation was dispatched.
    Started(TreeOperation),
    /// The operation completed. Sent exactly once, last.
    Complete(OperationComplete),
}

/// Executes tree operations on a tokio runtime and reports over a channel.
#[derive(Debug, Clone, Default)]
pub struct OperationExecutor {
    config: EngineConfig,
}

impl OperationExecutor {
    /// Create a new executor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor using `config` for every facade it builds.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start `operation` in the background.
    ///
    /// Returns a receiver yielding [`OperationEvent::Started`] followed by a
    /// single [`OperationEvent::Complete`].
    pub fn execute(&self, operation: TreeOperation) -> mpsc::Receiver<OperationEvent> {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let ops = FileOps::new(self.config.clone());

        tokio::spawn(async move {
            let operation_type = operation.operation_type();
            let _ = tx.send(OperationEvent::Started(operation.clone())).await;

            let outcome = run(&ops, operation).await;
            // A detached deltree runs on its own facade and is not awaited here.
            ops.tracker().wait_idle().await;

            let complete = match outcome {
                Ok((report, detached)) => OperationComplete {
                    operation_type,
                    report,
                    error: None,
                    detached,
                },
                Err(e) => OperationComplete {
                    operation_type,
                    report: TreeReport::default(),
                    error: Some(e.to_string()),
                    detached: false,
                },
            };
            let _ = tx.send(OperationEvent::Complete(complete)).await;
        });

        rx
    }
}

async fn run(ops: &FileOps, operation: TreeOperation) -> Result<(TreeReport, bool)> {
    match operation {
        TreeOperation::Delete { path } => Ok((delete_folder_recursive(ops, &path).await?, false)),
        TreeOperation::Deltree { path, wait } => match deltree(ops, &path).await? {
            Deltree::Renamed(_) if !wait => Ok((TreeReport::default(), true)),
            outcome => Ok((outcome.finish().await?, false)),
        },
        TreeOperation::MakeDirs { path } => {
            make_dirs(ops, &path).await?;
            Ok((TreeReport::default(), false))
        }
        TreeOperation::Copy {
            source,
            destination,
        } => Ok((copy_recursive(ops, &source, &destination).await?, false)),
    }
}
