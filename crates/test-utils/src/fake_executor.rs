use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use jobdag::dag::ScheduledTask;
use jobdag::engine::{RuntimeEvent, TaskOutcome};
use jobdag::errors::Result;
use jobdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run", in launch order
/// - immediately reports TaskCompleted for each scheduled task, failing the
///   ones configured with [`FakeExecutor::failing`].
pub struct FakeExecutor {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    /// Tasks that should report `Failed(1)`.
    pub fn failing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(names.into_iter().map(Into::into));
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn launch_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed(1)
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                })
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
