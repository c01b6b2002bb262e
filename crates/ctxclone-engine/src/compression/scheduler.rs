//! Scheduling, retry, and reintegration (§4.2 "Scheduling and concurrency",
//! "Retry policy", "Reintegration").

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};

use ctxclone_types::tokens::estimate_tokens;
use ctxclone_types::{
    CanonicalSession, CompressionStats, CompressionTask, CompressionTaskStatus, ContentBlock,
    Entry, MessageContent,
};

use super::provider::{CompressionProvider, ProviderError};

#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    pub concurrency: usize,
    pub timeout_initial_ms: u64,
    pub max_attempts: u32,
    pub thinking_threshold: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout_initial_ms: 5_000,
            max_attempts: 4,
            thinking_threshold: 1_000,
        }
    }
}

/// Multiplier sequence applied to the task's first-attempt timeout on each
/// retry: 1.5, 2.0, 2.5, 3.0, 3.0, … (testable property #6). `attempt` is the
/// attempt count *after* the failure that triggered this retry.
fn retry_multiplier(attempt: u32) -> f64 {
    match attempt {
        1 => 1.5,
        2 => 2.0,
        3 => 2.5,
        _ => 3.0,
    }
}

type TaskFuture = Pin<Box<dyn Future<Output = (usize, Result<String, ProviderError>)> + Send>>;

async fn run_one(
    index: usize,
    content: String,
    level: ctxclone_types::CompressionLevel,
    use_large_model: bool,
    timeout_ms: u64,
    provider: Arc<dyn CompressionProvider>,
) -> (usize, Result<String, ProviderError>) {
    match tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        provider.compress(&content, level, use_large_model),
    )
    .await
    {
        Ok(inner) => (index, inner),
        Err(_) => (index, Err(ProviderError::Timeout)),
    }
}

fn dispatch(
    index: usize,
    tasks: &mut [CompressionTask],
    config: CompressionConfig,
    provider: &Arc<dyn CompressionProvider>,
) -> TaskFuture {
    let task = &mut tasks[index];
    task.status = CompressionTaskStatus::InFlight;
    let use_large_model = task.estimated_tokens > config.thinking_threshold;
    Box::pin(run_one(
        index,
        task.original_content.clone(),
        task.level,
        use_large_model,
        task.timeout_ms,
        provider.clone(),
    ))
}

fn apply_outcome(
    task: &mut CompressionTask,
    config: CompressionConfig,
    outcome: Result<String, ProviderError>,
) {
    let failure = match outcome {
        Ok(text) if !text.is_empty() => {
            task.status = CompressionTaskStatus::Success;
            task.result = Some(text);
            None
        }
        Ok(_empty) => Some(ProviderError::EmptyOutput.to_string()),
        Err(err) => Some(err.to_string()),
    };

    let Some(error) = failure else { return };

    task.error = Some(error);
    task.attempt += 1;
    if task.attempt >= config.max_attempts {
        task.status = CompressionTaskStatus::Failed;
    } else {
        task.status = CompressionTaskStatus::Pending;
        task.timeout_ms =
            (config.timeout_initial_ms as f64 * retry_multiplier(task.attempt)).round() as u64;
    }
}

/// Runs every task to a terminal status, then reintegrates successful
/// results into `session`. At most `config.concurrency` provider calls are
/// ever in flight at once (testable property #8); the retry loop processes
/// tasks until every task is `success` or `failed` (§4.2 "Retry policy").
pub async fn run_compression(
    session: &CanonicalSession,
    mut tasks: Vec<CompressionTask>,
    skipped_below_min_tokens: usize,
    provider: Arc<dyn CompressionProvider>,
    config: CompressionConfig,
) -> (CanonicalSession, CompressionStats) {
    let mut pending: VecDeque<usize> = (0..tasks.len()).collect();
    let mut in_flight: FuturesUnordered<TaskFuture> = FuturesUnordered::new();

    while in_flight.len() < config.concurrency {
        let Some(index) = pending.pop_front() else {
            break;
        };
        in_flight.push(dispatch(index, &mut tasks, config, &provider));
    }

    while let Some((index, outcome)) = in_flight.next().await {
        apply_outcome(&mut tasks[index], config, outcome);

        if !tasks[index].is_terminal() {
            pending.push_back(index);
        }

        while in_flight.len() < config.concurrency {
            let Some(next_index) = pending.pop_front() else {
                break;
            };
            in_flight.push(dispatch(next_index, &mut tasks, config, &provider));
        }
    }

    // Ordering guarantee: results are assembled in ascending `messageIndex`
    // before reintegration, independent of completion order.
    tasks.sort_by_key(|t| t.message_index);
    reintegrate(session, &tasks, skipped_below_min_tokens)
}

fn reintegrate(
    session: &CanonicalSession,
    tasks: &[CompressionTask],
    skipped_below_min_tokens: usize,
) -> (CanonicalSession, CompressionStats) {
    let mut entries = session.entries.clone();
    let mut stats = CompressionStats {
        messages_skipped: skipped_below_min_tokens,
        ..Default::default()
    };

    for task in tasks {
        match task.status {
            CompressionTaskStatus::Success => {
                let compressed = task.result.clone().unwrap_or_default();
                stats.original_tokens += task.estimated_tokens as u64;
                stats.compressed_tokens += estimate_tokens(&compressed) as u64;
                stats.messages_compressed += 1;
                replace_text_content(&mut entries[task.message_index], &compressed);
            }
            CompressionTaskStatus::Failed => {
                // Original content is left intact (§4.2 "Reintegration");
                // still counted toward the original/compressed token sums
                // so reductionPercent reflects what was actually attempted.
                stats.original_tokens += task.estimated_tokens as u64;
                stats.compressed_tokens += task.estimated_tokens as u64;
                stats.messages_failed += 1;
            }
            CompressionTaskStatus::Pending | CompressionTaskStatus::InFlight => {
                // Unreachable once the retry loop has run every task to a
                // terminal status; treated as a no-op rather than panicking.
            }
        }
    }

    stats.tokens_removed = stats.original_tokens.saturating_sub(stats.compressed_tokens);
    stats.reduction_percent =
        CompressionStats::compute_reduction_percent(stats.original_tokens, stats.compressed_tokens);

    (CanonicalSession::new(session.session_id.clone(), entries), stats)
}

/// Replaces the first text block's content with `compressed` and drops any
/// further text blocks; thinking and tool blocks are left untouched (§4.2).
fn replace_text_content(entry: &mut Entry, compressed: &str) {
    let Some(message) = &mut entry.message else {
        return;
    };

    match &mut message.content {
        MessageContent::Text(text) => *text = compressed.to_string(),
        MessageContent::Blocks(blocks) => {
            let mut replaced = false;
            let mut kept = Vec::with_capacity(blocks.len());
            for block in std::mem::take(blocks) {
                match block {
                    ContentBlock::Text { .. } if !replaced => {
                        kept.push(ContentBlock::Text {
                            text: compressed.to_string(),
                        });
                        replaced = true;
                    }
                    ContentBlock::Text { .. } => {}
                    other => kept.push(other),
                }
            }
            if !replaced {
                kept.push(ContentBlock::Text {
                    text: compressed.to_string(),
                });
            }
            *blocks = kept;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ctxclone_types::{CompressionLevel, EntryKind, Message, Role};
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn user_entry(text: &str) -> Entry {
        Entry {
            uuid: None,
            parent_uuid: None,
            kind: EntryKind::User,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::Text { text: text.into() }]),
            }),
            timestamp: None,
            cwd: None,
            model: None,
            stop_reason: None,
            usage: None,
            extra: Map::new(),
        }
    }

    fn task(message_index: usize, content: &str) -> CompressionTask {
        CompressionTask::new(
            message_index,
            Role::User,
            content.to_string(),
            CompressionLevel::Compress,
            estimate_tokens(content),
            1_000,
        )
    }

    /// Fails a fixed number of times (per message index) before succeeding.
    struct FlakyProvider {
        fail_times: usize,
        calls: Mutex<std::collections::HashMap<String, usize>>,
    }

    #[async_trait]
    impl CompressionProvider for FlakyProvider {
        async fn compress(
            &self,
            text: &str,
            _level: CompressionLevel,
            _use_large_model: bool,
        ) -> Result<String, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(text.to_string()).or_insert(0);
            *count += 1;
            if *count <= self.fail_times {
                Err(ProviderError::Transport("flaky".into()))
            } else {
                Ok("compressed on retry".to_string())
            }
        }
    }

    struct AlwaysFailsProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompressionProvider for AlwaysFailsProvider {
        async fn compress(
            &self,
            _text: &str,
            _level: CompressionLevel,
            _use_large_model: bool,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Transport("down".into()))
        }
    }

    struct CountingConcurrencyProvider {
        current: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompressionProvider for CountingConcurrencyProvider {
        async fn compress(
            &self,
            _text: &str,
            _level: CompressionLevel,
            _use_large_model: bool,
        ) -> Result<String, ProviderError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn retry_then_success_yields_attempt_one_s4() {
        let session = CanonicalSession::new("s1", vec![user_entry("hello there friend")]);
        let tasks = vec![task(0, "hello there friend")];
        let provider = Arc::new(FlakyProvider {
            fail_times: 1,
            calls: Mutex::new(std::collections::HashMap::new()),
        });

        let (cloned, stats) =
            run_compression(&session, tasks, 0, provider, CompressionConfig::default()).await;

        assert_eq!(stats.messages_compressed, 1);
        assert_eq!(stats.messages_failed, 0);
        assert_eq!(
            cloned.entries[0].text_content().as_deref(),
            Some("compressed on retry")
        );
    }

    #[tokio::test]
    async fn max_retries_exhausted_marks_task_failed_s5() {
        let session = CanonicalSession::new("s1", vec![user_entry("hello there friend")]);
        let tasks = vec![task(0, "hello there friend")];
        let provider = Arc::new(AlwaysFailsProvider {
            calls: AtomicUsize::new(0),
        });
        let provider_clone = provider.clone();

        let config = CompressionConfig {
            max_attempts: 4,
            ..Default::default()
        };
        let (cloned, stats) = run_compression(&session, tasks, 0, provider, config).await;

        assert_eq!(stats.messages_failed, 1);
        assert_eq!(stats.messages_compressed, 0);
        assert_eq!(provider_clone.calls.load(Ordering::SeqCst), 4);
        // Original content is retained on terminal failure.
        assert_eq!(
            cloned.entries[0].text_content().as_deref(),
            Some("hello there friend")
        );
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_configured_bound() {
        let session_entries: Vec<Entry> = (0..20).map(|i| user_entry(&format!("msg {i}"))).collect();
        let session = CanonicalSession::new("s1", session_entries);
        let tasks: Vec<CompressionTask> = (0..20)
            .map(|i| task(i, &format!("msg {i}")))
            .collect();

        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(CountingConcurrencyProvider {
            current: current.clone(),
            peak: peak.clone(),
        });

        let config = CompressionConfig {
            concurrency: 3,
            ..Default::default()
        };
        let (_cloned, stats) = run_compression(&session, tasks, 0, provider, config).await;

        assert_eq!(stats.messages_compressed, 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn skipped_count_passes_through_to_stats() {
        let session = CanonicalSession::new("s1", vec![user_entry("hi")]);
        let provider = Arc::new(AlwaysFailsProvider {
            calls: AtomicUsize::new(0),
        });
        let (_cloned, stats) =
            run_compression(&session, vec![], 5, provider, CompressionConfig::default()).await;
        assert_eq!(stats.messages_skipped, 5);
        assert_eq!(stats.reduction_percent, 0);
    }

    #[tokio::test]
    async fn results_reintegrate_in_ascending_message_index_order() {
        let session = CanonicalSession::new(
            "s1",
            vec![user_entry("first message"), user_entry("second message")],
        );
        // Construct tasks out of message-index order to exercise the sort.
        let tasks = vec![task(1, "second message"), task(0, "first message")];
        let provider = Arc::new(CountingConcurrencyProvider {
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        });

        let (cloned, stats) =
            run_compression(&session, tasks, 0, provider, CompressionConfig::default()).await;

        assert_eq!(stats.messages_compressed, 2);
        assert_eq!(cloned.entries[0].text_content().as_deref(), Some("done"));
        assert_eq!(cloned.entries[1].text_content().as_deref(), Some("done"));
    }
}
