#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use jobdag::dag::{DagGraph, Scheduler};
use jobdag::engine::{CoreRuntime, PoolLimits, RunResult, Runtime, RuntimeEvent, RuntimeOptions};
use jobdag::fs::FileSystem;
use jobdag_test_utils::fake_executor::FakeExecutor;

pub use jobdag_test_utils::{init_tracing, with_timeout};

/// Run `dag` through the real runtime loop with a [`FakeExecutor`].
///
/// Returns the run result and the launch order.
pub async fn run_with_fake(
    dag: DagGraph,
    limits: PoolLimits,
    options: RuntimeOptions,
    fs: Arc<dyn FileSystem>,
    failing: &[&str],
) -> (RunResult, Vec<String>) {
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor =
        FakeExecutor::new(rt_tx, executed.clone()).failing(failing.iter().copied());

    let core = CoreRuntime::new(Scheduler::new(dag), limits, options, fs)
        .expect("pool too small for test graph");
    let runtime = Runtime::new(core, rt_rx, executor);

    let result = with_timeout(runtime.run()).await.expect("runtime failed");
    let order = executed.lock().unwrap().clone();
    (result, order)
}
