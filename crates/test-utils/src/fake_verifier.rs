use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use verirun::errors::Result;
use verirun::exec::{Verifier, VerifierReport};

/// Scripted behaviour for one task.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Report exit code 0 immediately.
    Succeed,
    /// Report the given nonzero exit code immediately.
    Fail(i32),
    /// Sleep for the given duration, then report exit code 0.
    Delay(Duration),
    /// Sleep far beyond any reasonable timeout; used to provoke the
    /// executor's forced termination.
    Hang,
}

#[derive(Default)]
struct Recorded {
    /// Task names in invocation order.
    executed: Vec<String>,
    active: usize,
    peak_active: usize,
}

/// A fake verifier that:
/// - records which tasks were invoked, in order
/// - tracks the peak number of concurrently active invocations
/// - resolves each invocation according to its [`Script`]
///   (unknown tasks succeed).
pub struct FakeVerifier {
    scripts: HashMap<String, Script>,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    pub fn succeed(self, task: &str) -> Self {
        self.script(task, Script::Succeed)
    }

    pub fn fail(self, task: &str, code: i32) -> Self {
        self.script(task, Script::Fail(code))
    }

    pub fn delay(self, task: &str, duration: Duration) -> Self {
        self.script(task, Script::Delay(duration))
    }

    pub fn hang(self, task: &str) -> Self {
        self.script(task, Script::Hang)
    }

    pub fn script(mut self, task: &str, script: Script) -> Self {
        self.scripts.insert(task.to_string(), script);
        self
    }

    /// Task names in the order their verifier invocations started.
    pub fn executed(&self) -> Vec<String> {
        self.recorded.lock().unwrap().executed.clone()
    }

    /// Highest number of invocations that were in flight at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.recorded.lock().unwrap().peak_active
    }
}

impl Default for FakeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier for FakeVerifier {
    fn execute(
        &self,
        task: &str,
        _timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<VerifierReport>> + Send + 'static>> {
        let script = self.scripts.get(task).copied().unwrap_or(Script::Succeed);
        let recorded = Arc::clone(&self.recorded);
        let task = task.to_string();

        Box::pin(async move {
            {
                let mut guard = recorded.lock().unwrap();
                guard.executed.push(task.clone());
                guard.active += 1;
                guard.peak_active = guard.peak_active.max(guard.active);
            }

            let exit_code = match script {
                Script::Succeed => 0,
                Script::Fail(code) => code,
                Script::Delay(duration) => {
                    tokio::time::sleep(duration).await;
                    0
                }
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    0
                }
            };

            recorded.lock().unwrap().active -= 1;

            Ok(VerifierReport {
                exit_code,
                duration: Duration::from_millis(1),
                log_path: None,
            })
        })
    }
}
