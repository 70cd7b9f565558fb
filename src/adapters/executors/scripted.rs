//! Scripted executor for tests and dry runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::ports::{CommandExecutor, ExecutorError, ExecutorResult};

/// [`CommandExecutor`] that replays a fixed list of responses.
///
/// Response `n` answers call `n`; once the script runs out the last response
/// repeats. Calls, prompts and peak concurrency are recorded for assertions.
#[derive(Debug)]
pub struct ScriptedExecutor {
    script: Vec<ExecutorResult<String>>,
    latency: Duration,
    available: AtomicBool,
    calls: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn with_script(script: Vec<ExecutorResult<String>>) -> Self {
        Self {
            script,
            latency: Duration::ZERO,
            available: AtomicBool::new(true),
            calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with `output`.
    pub fn always_ok(output: impl Into<String>) -> Self {
        Self::with_script(vec![Ok(output.into())])
    }

    /// Every call fails with `error`.
    pub fn always_err(error: ExecutorError) -> Self {
        Self::with_script(vec![Err(error)])
    }

    /// Simulated time each call takes. Calls slower than their timeout fail
    /// with [`ExecutorError::Timeout`].
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report the assistant as unavailable in the preflight.
    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn response(&self, call: usize) -> ExecutorResult<String> {
        self.script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn invoke(&self, prompt: &str, timeout: Duration) -> ExecutorResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            if self.latency > timeout {
                tokio::time::sleep(timeout).await;
                return Err(ExecutorError::Timeout { after: timeout });
            }
            tokio::time::sleep(self.latency).await;
        }

        self.response(call)
    }
}
