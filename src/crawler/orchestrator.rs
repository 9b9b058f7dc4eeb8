//! Crawl orchestration
//!
//! One orchestrator serves many tasks, but each `run` owns its frontier
//! and drives a single task to a terminal status. Workers fetch pages
//! concurrently; discovery happens only in the orchestrating loop, so the
//! frontier needs no locking.

use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::limits::{ConcurrencyController, Outcome, RateLimiter};
use crate::models::{
    CrawlRequest, CrawlResult, CrawlStatus, CrawlTask, CrawledPage, ExtractFlags, PageError,
};
use crate::retry::RetryPolicy;
use crate::storage::Persistence;
use crate::url::{extract_host, normalize};
use crate::{Config, CrawlerError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Drives crawl tasks from submission to a terminal status
pub struct Orchestrator {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    rate_limiter: Arc<RateLimiter>,
    concurrency: Arc<ConcurrencyController>,
    retry_policy: Arc<RetryPolicy>,
    storage: Arc<dyn Persistence>,
}

/// Everything a worker reports back for one URL
struct PageOutcome {
    page: CrawledPage,
    url: Url,
    transient_errors: u64,
    permanent_errors: u64,
}

impl Orchestrator {
    /// Creates an orchestrator with the real HTTP fetcher
    pub fn new(config: Arc<Config>, storage: Arc<dyn Persistence>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.crawler.user_agent)?);
        Ok(Self::with_fetcher(config, fetcher, storage))
    }

    /// Creates an orchestrator with a caller-provided fetcher
    pub fn with_fetcher(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Persistence>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let concurrency = Arc::new(ConcurrencyController::new(&config.concurrency));
        let retry_policy = Arc::new(RetryPolicy::new(&config.retry));
        Self {
            config,
            fetcher,
            rate_limiter,
            concurrency,
            retry_policy,
            storage,
        }
    }

    /// Validates the root URL, creates a pending task, and persists it
    pub fn submit(&self, request: CrawlRequest) -> Result<CrawlTask> {
        normalize(&request.url, None)?;
        let task = CrawlTask::new(request);
        self.storage.save_task(&task)?;
        info!(task_id = %task.task_id, url = %task.request.url, "task submitted");
        Ok(task)
    }

    /// Runs a task to completion, failure, or cancellation
    ///
    /// Cancellation is graceful: in-flight fetches finish and their pages
    /// are recorded, but nothing new is dequeued and no retries are
    /// scheduled after the token fires.
    pub async fn run(&self, task: &CrawlTask, cancel: CancellationToken) -> Result<CrawlResult> {
        let root = normalize(&task.request.url, None)?;
        self.storage
            .update_task_status(&task.task_id, CrawlStatus::InProgress)?;

        let max_depth = if task.request.max_depth > 0 {
            task.request.max_depth
        } else {
            self.config.crawler.max_depth
        };
        let mut frontier = Frontier::seed(root, &task.request.url).with_max_depth(max_depth);

        let headers = task.request.custom_headers.clone().unwrap_or_default();
        let timeout = if task.request.timeout_secs > 0 {
            Duration::from_secs(task.request.timeout_secs)
        } else {
            Duration::from_secs(self.config.crawler.default_timeout_secs)
        };

        let mut result = CrawlResult::started(&task.task_id);
        let mut in_flight: JoinSet<PageOutcome> = JoinSet::new();
        let burst = self.concurrency.burst_limit() as usize;
        let mut cancel_seen = false;
        let mut root_failed = false;

        loop {
            // Cancellation must stop dequeues before the next dispatch
            // batch, not only once the select below is polled
            if cancel.is_cancelled() && !cancel_seen {
                info!(task_id = %task.task_id, "cancellation requested, draining in-flight fetches");
                cancel_seen = true;
                frontier.cancel();
            }

            while in_flight.len() < burst {
                let Some(entry) = frontier.next() else { break };
                debug!(url = %entry.url, depth = entry.depth, "dispatching fetch");
                in_flight.spawn(crawl_one(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.rate_limiter),
                    Arc::clone(&self.concurrency),
                    Arc::clone(&self.retry_policy),
                    entry,
                    headers.clone(),
                    timeout,
                    task.request.extract.clone(),
                    cancel.clone(),
                ));
            }

            if in_flight.is_empty() {
                frontier.mark_drained();
                break;
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !cancel_seen => {
                    info!(task_id = %task.task_id, "cancellation requested, draining in-flight fetches");
                    cancel_seen = true;
                    frontier.cancel();
                    continue;
                }
                joined = in_flight.join_next() => joined,
            };

            let outcome = match joined {
                Some(Ok(outcome)) => outcome,
                Some(Err(e)) => {
                    warn!(error = %e, "fetch worker aborted");
                    continue;
                }
                None => continue,
            };

            if let Err(e) = self.storage.save_page(&task.task_id, &outcome.page) {
                warn!(url = %outcome.url, error = %e, "failed to persist page");
            }

            self.record(&mut result, &outcome);

            if outcome.page.depth == 0 && outcome.page.error.is_some() {
                root_failed = true;
            }

            if outcome.page.error.is_none() && task.request.follow_links && !cancel_seen {
                let enqueued =
                    frontier.discover(&outcome.page.links, outcome.page.depth, &outcome.url);
                if enqueued > 0 {
                    debug!(from = %outcome.url, enqueued, "discovered new urls");
                }
            }

            result.pages.push(outcome.page);
        }

        let status = if cancel_seen {
            CrawlStatus::Cancelled
        } else if root_failed {
            CrawlStatus::Failed
        } else {
            CrawlStatus::Completed
        };

        result.status = status;
        result.total_pages = result.pages.len();
        result.completed_at = Some(Utc::now());
        if let (Some(started), Some(completed)) = (result.started_at, result.completed_at) {
            result.duration = Some((completed - started).num_milliseconds() as f64 / 1000.0);
        }

        self.storage.save_task_result(&result)?;
        self.storage.update_task_status(&task.task_id, status)?;
        info!(
            task_id = %task.task_id,
            ?status,
            pages = result.total_pages,
            errors = result.errors.len(),
            "task finished"
        );

        if root_failed {
            return Err(CrawlerError::RootUnreachable {
                url: task.request.url.clone(),
                message: result
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "root fetch failed".to_string()),
            });
        }

        Ok(result)
    }

    /// Folds one page outcome into the running result's error lists and
    /// retry statistics
    fn record(&self, result: &mut CrawlResult, outcome: &PageOutcome) {
        let stats = &mut result.retry_stats;
        stats.total_retries += u64::from(outcome.page.retry_attempts);
        stats.transient_errors += outcome.transient_errors;
        stats.permanent_errors += outcome.permanent_errors;

        match &outcome.page.error {
            None => {
                if outcome.page.retry_attempts > 0 {
                    stats.successful_retries += 1;
                }
            }
            Some(error) => {
                if outcome.page.retry_attempts > 0 {
                    stats.failed_retries += 1;
                }
                result.errors.push(error.message.clone());
                result.structured_errors.push(error.clone());
            }
        }
    }
}

/// Fetches one URL with rate limiting, concurrency permits, and retries
#[allow(clippy::too_many_arguments)]
async fn crawl_one(
    fetcher: Arc<dyn Fetcher>,
    rate_limiter: Arc<RateLimiter>,
    concurrency: Arc<ConcurrencyController>,
    retry_policy: Arc<RetryPolicy>,
    entry: FrontierEntry,
    headers: HashMap<String, String>,
    timeout: Duration,
    flags: ExtractFlags,
    cancel: CancellationToken,
) -> PageOutcome {
    let domain = extract_host(&entry.url).unwrap_or_default();
    let permit = concurrency.acquire().await;

    let mut page = CrawledPage::reached(entry.raw.clone(), entry.url.to_string(), entry.depth);
    let mut transient_errors = 0u64;
    let mut permanent_errors = 0u64;
    let mut retries = 0u32;

    let outcome = loop {
        rate_limiter.admit(&domain).await;
        let started = Instant::now();

        match fetcher.fetch(entry.url.as_str(), &headers, timeout).await {
            Ok(response) => {
                let content = extract(&response.body, &entry.url, &flags);
                page.status_code = response.status;
                page.response_time = response.elapsed.as_secs_f64();
                page.title = content.title;
                page.text_content = content.text_content;
                page.images = content.images;
                page.links = content.links;
                page.meta_description = content.meta_description;
                page.headings = content.headings;
                page.image_alt_text = content.image_alt_text;
                page.canonical_url = content.canonical_url;
                page.retry_attempts = retries;
                page.crawled_at = Utc::now();
                break Outcome::Success;
            }
            Err(failure) => {
                match retry_policy.classify(&failure) {
                    crate::retry::ErrorKind::Transient => transient_errors += 1,
                    crate::retry::ErrorKind::Permanent => permanent_errors += 1,
                }

                if !cancel.is_cancelled() && retry_policy.should_retry(&failure, retries) {
                    retries += 1;
                    let delay = retry_policy.next_delay(retries);
                    warn!(
                        url = %entry.url,
                        attempt = retries,
                        ?delay,
                        error = %failure,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                page.status_code = failure.status_code().unwrap_or(0);
                page.response_time = started.elapsed().as_secs_f64();
                page.retry_attempts = retries;
                page.crawled_at = Utc::now();
                page.error = Some(PageError {
                    kind: retry_policy.classify(&failure),
                    status_code: failure.status_code(),
                    message: failure.to_string(),
                    url: entry.url.to_string(),
                    timestamp: page.crawled_at,
                    retry_attempts: retries,
                });
                break Outcome::Failure;
            }
        }
    };

    concurrency.release(permit, outcome);

    PageOutcome {
        page,
        url: entry.url,
        transient_errors,
        permanent_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchFailure, FetchResponse};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fetcher that replays scripted responses per URL
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, VecDeque<std::result::Result<String, FetchFailure>>>>,
        fetch_count: Mutex<HashMap<String, u32>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                fetch_count: Mutex::new(HashMap::new()),
            }
        }

        fn script(
            &self,
            url: &str,
            responses: Vec<std::result::Result<String, FetchFailure>>,
        ) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), responses.into());
        }

        fn count(&self, url: &str) -> u32 {
            self.fetch_count
                .lock()
                .unwrap()
                .get(url)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            url: &str,
            _headers: &HashMap<String, String>,
            _timeout: Duration,
        ) -> std::result::Result<FetchResponse, FetchFailure> {
            *self
                .fetch_count
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_insert(0) += 1;

            let next = self
                .responses
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front());

            match next {
                Some(Ok(body)) => Ok(FetchResponse {
                    status: 200,
                    body,
                    elapsed: Duration::from_millis(5),
                }),
                Some(Err(failure)) => Err(failure),
                None => Err(FetchFailure::Connect(format!("no script for {url}"))),
            }
        }
    }

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.retry.base_delay_ms = 1;
        config.retry.max_delay_ms = 5;
        config.rate_limit.default_limit = 1000;
        Arc::new(config)
    }

    fn orchestrator(fetcher: Arc<ScriptedFetcher>) -> (Orchestrator, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let orchestrator =
            Orchestrator::with_fetcher(fast_config(), fetcher, Arc::clone(&storage) as _);
        (orchestrator, storage)
    }

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"{l}\">x</a>"))
            .collect();
        format!("<html><head><title>t</title></head><body>{anchors}</body></html>")
    }

    #[tokio::test]
    async fn test_single_page_crawl_completes() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script("https://a.example/", vec![Ok(page(&[]))]);
        let (orchestrator, storage) = orchestrator(Arc::clone(&fetcher));

        let task = orchestrator
            .submit(CrawlRequest::new("https://a.example/"))
            .unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, CrawlStatus::Completed);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].status_code, 200);
        assert_eq!(storage.pages(&task.task_id).len(), 1);
        assert_eq!(
            storage.task(&task.task_id).unwrap().status,
            CrawlStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_follow_links_respects_depth_and_domain() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&["https://a.example/one", "https://other.example/out"]))],
        );
        fetcher.script(
            "https://a.example/one",
            vec![Ok(page(&["https://a.example/two"]))],
        );
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let mut request = CrawlRequest::new("https://a.example/");
        request.follow_links = true;
        request.max_depth = 1;
        let task = orchestrator.submit(request).unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        // Root plus one internal link; the cross-domain link and the
        // depth-2 link are observed but never fetched
        assert_eq!(result.total_pages, 2);
        assert_eq!(fetcher.count("https://other.example/out"), 0);
        assert_eq!(fetcher.count("https://a.example/two"), 0);
        assert!(result.pages[0]
            .links
            .contains(&"https://other.example/out".to_string()));
    }

    #[tokio::test]
    async fn test_follow_links_disabled_fetches_only_root() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&["https://a.example/one"]))],
        );
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let task = orchestrator
            .submit(CrawlRequest::new("https://a.example/"))
            .unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.total_pages, 1);
        assert_eq!(fetcher.count("https://a.example/one"), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_succeed() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![
                Err(FetchFailure::HttpStatus(500)),
                Err(FetchFailure::HttpStatus(500)),
                Err(FetchFailure::HttpStatus(500)),
                Ok(page(&[])),
            ],
        );
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let task = orchestrator
            .submit(CrawlRequest::new("https://a.example/"))
            .unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, CrawlStatus::Completed);
        assert_eq!(result.pages[0].retry_attempts, 3);
        assert!(result.pages[0].error.is_none());
        assert_eq!(result.retry_stats.total_retries, 3);
        assert_eq!(result.retry_stats.successful_retries, 1);
        assert_eq!(result.retry_stats.transient_errors, 3);
        assert_eq!(fetcher.count("https://a.example/"), 4);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&["https://a.example/gone"]))],
        );
        fetcher.script(
            "https://a.example/gone",
            vec![Err(FetchFailure::HttpStatus(404))],
        );
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let mut request = CrawlRequest::new("https://a.example/");
        request.follow_links = true;
        let task = orchestrator.submit(request).unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        // A non-root permanent failure does not fail the task
        assert_eq!(result.status, CrawlStatus::Completed);
        assert_eq!(fetcher.count("https://a.example/gone"), 1);

        let failed = result
            .pages
            .iter()
            .find(|p| p.error.is_some())
            .unwrap();
        assert_eq!(failed.retry_attempts, 0);
        assert_eq!(failed.status_code, 404);
        assert_eq!(result.retry_stats.permanent_errors, 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_root_failure_fails_the_task() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Err(FetchFailure::HttpStatus(404))],
        );
        let (orchestrator, storage) = orchestrator(Arc::clone(&fetcher));

        let task = orchestrator
            .submit(CrawlRequest::new("https://a.example/"))
            .unwrap();
        let err = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlerError::RootUnreachable { .. }));
        assert_eq!(
            storage.task(&task.task_id).unwrap().status,
            CrawlStatus::Failed
        );
        let result = storage.result(&task.task_id).unwrap();
        assert_eq!(result.status, CrawlStatus::Failed);
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_record_transient_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&["https://a.example/flaky"]))],
        );
        fetcher.script(
            "https://a.example/flaky",
            vec![
                Err(FetchFailure::HttpStatus(503)),
                Err(FetchFailure::HttpStatus(503)),
                Err(FetchFailure::HttpStatus(503)),
                Err(FetchFailure::HttpStatus(503)),
            ],
        );
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let mut request = CrawlRequest::new("https://a.example/");
        request.follow_links = true;
        let task = orchestrator.submit(request).unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        let failed = result
            .pages
            .iter()
            .find(|p| p.error.is_some())
            .unwrap();
        assert_eq!(failed.retry_attempts, 3);
        assert_eq!(result.retry_stats.failed_retries, 1);
        assert_eq!(result.retry_stats.transient_errors, 4);
        assert_eq!(fetcher.count("https://a.example/flaky"), 4);
    }

    #[tokio::test]
    async fn test_duplicate_links_fetch_once() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&[
                "https://a.example/p",
                "https://a.example/p/",
                "https://a.example/p",
            ]))],
        );
        fetcher.script("https://a.example/p", vec![Ok(page(&[]))]);
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let mut request = CrawlRequest::new("https://a.example/");
        request.follow_links = true;
        let task = orchestrator.submit(request).unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.total_pages, 2);
        assert_eq!(fetcher.count("https://a.example/p"), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_yields_cancelled_status() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script("https://a.example/", vec![Ok(page(&[]))]);
        let (orchestrator, storage) = orchestrator(Arc::clone(&fetcher));

        let token = CancellationToken::new();
        token.cancel();

        let task = orchestrator
            .submit(CrawlRequest::new("https://a.example/"))
            .unwrap();
        let result = orchestrator.run(&task, token).await.unwrap();

        // Nothing may be dispatched once the token has fired, not even
        // the root
        assert_eq!(result.status, CrawlStatus::Cancelled);
        assert_eq!(result.total_pages, 0);
        assert_eq!(fetcher.count("https://a.example/"), 0);
        assert_eq!(
            storage.task(&task.task_id).unwrap().status,
            CrawlStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_pages_record_discovered_url_and_normalized_form() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.script(
            "https://a.example/",
            vec![Ok(page(&["https://a.example/p/"]))],
        );
        fetcher.script("https://a.example/p", vec![Ok(page(&[]))]);
        let (orchestrator, _) = orchestrator(Arc::clone(&fetcher));

        let mut request = CrawlRequest::new("https://a.example/");
        request.follow_links = true;
        let task = orchestrator.submit(request).unwrap();
        let result = orchestrator
            .run(&task, CancellationToken::new())
            .await
            .unwrap();

        let inner = result
            .pages
            .iter()
            .find(|p| p.depth == 1)
            .unwrap();
        assert_eq!(inner.url, "https://a.example/p/");
        assert_eq!(inner.normalized_url, "https://a.example/p");
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_root() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let (orchestrator, _) = orchestrator(fetcher);

        assert!(orchestrator
            .submit(CrawlRequest::new("ftp://a.example/file"))
            .is_err());
        assert!(orchestrator.submit(CrawlRequest::new("not a url")).is_err());
    }
}
