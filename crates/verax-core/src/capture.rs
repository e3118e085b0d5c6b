//! Evidence capture adapter.
//!
//! Wraps a browser driver behind [`CaptureDriver`] and turns every driver
//! error, timeout or empty payload into a structured [`CaptureFailure`].
//! Nothing is thrown past this boundary.
//!
//! Idempotent captures (screenshot, DOM signature, URL, UI signals) are
//! retried up to [`RetryPolicy::max_retries`] times with a fixed delay.
//! Stopping the network window consumes the window, so it runs once.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::evidence::{CaptureFailure, CaptureReasonCode, CaptureStage, PageSnapshot};
use crate::domain::trace::{NetworkSignals, UiSignals};
use crate::metrics::METRICS;

// ---------------------------------------------------------------------------
// Driver trait
// ---------------------------------------------------------------------------

/// Browser driver backend. Implementations return `anyhow` errors freely;
/// [`EvidenceCapture`] classifies them.
#[async_trait]
pub trait CaptureDriver: Send + Sync {
    /// Write a screenshot for `target` and return its path.
    async fn screenshot(&self, target: &str) -> anyhow::Result<String>;
    /// Digest of the current DOM. Empty means the page did not render.
    async fn dom_signature(&self, target: &str) -> anyhow::Result<String>;
    async fn current_url(&self) -> anyhow::Result<String>;
    async fn ui_signals(&self) -> anyhow::Result<UiSignals>;
    /// Close the network observation window and return what it saw.
    async fn stop_network_window(&self) -> anyhow::Result<NetworkSignals>;
}

// ---------------------------------------------------------------------------
// Policy and outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = run once).
    pub max_retries: u32,
    /// Fixed delay between attempts (milliseconds).
    pub delay_ms: u64,
    /// Per-attempt timeout (milliseconds). `None` waits for the driver.
    pub timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay_ms: 250,
            timeout_ms: Some(10_000),
        }
    }
}

/// `{success, value, failure}`: exactly one of `value`/`failure` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureOutcome<T> {
    pub success: bool,
    pub value: Option<T>,
    pub failure: Option<CaptureFailure>,
}

impl<T> CaptureOutcome<T> {
    fn ok(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            failure: None,
        }
    }

    fn failed(failure: CaptureFailure) -> Self {
        Self {
            success: false,
            value: None,
            failure: Some(failure),
        }
    }
}

/// Snapshot of one side of an interaction plus whatever failed capturing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCapture {
    pub snapshot: PageSnapshot,
    pub failures: Vec<CaptureFailure>,
}

enum AttemptError {
    Timeout(u64),
    Empty(CaptureReasonCode, &'static str),
    Driver(anyhow::Error),
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct EvidenceCapture<D> {
    driver: D,
    policy: RetryPolicy,
}

impl<D: CaptureDriver> EvidenceCapture<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    async fn attempt<T, F, Fut>(
        &self,
        stage: CaptureStage,
        retries: u32,
        op: F,
    ) -> CaptureOutcome<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max_attempts = retries + 1;
        let mut last = None;

        for attempt in 1..=max_attempts {
            let result = match self.policy.timeout_ms {
                Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), op()).await {
                    Ok(r) => r,
                    Err(_elapsed) => Err(AttemptError::Timeout(ms)),
                },
                None => op().await,
            };

            match result {
                Ok(value) => return CaptureOutcome::ok(value),
                Err(e) => {
                    tracing::debug!(?stage, attempt, max_attempts, "capture attempt failed");
                    last = Some(e);
                }
            }

            if attempt < max_attempts {
                METRICS.inc_capture_retries();
                tokio::time::sleep(Duration::from_millis(self.policy.delay_ms)).await;
            }
        }

        let (code, reason) = match last {
            Some(AttemptError::Timeout(ms)) => {
                (CaptureReasonCode::Timeout, format!("timed out after {ms}ms"))
            }
            Some(AttemptError::Empty(code, msg)) => (code, msg.to_string()),
            Some(AttemptError::Driver(e)) => (CaptureReasonCode::DriverError, format!("{e:#}")),
            None => (CaptureReasonCode::RetriesExhausted, "no attempt made".to_string()),
        };
        tracing::warn!(
            ?stage,
            code = code.as_str(),
            attempts = max_attempts,
            %reason,
            "capture failed"
        );
        CaptureOutcome::failed(CaptureFailure::new(stage, code, reason, max_attempts))
    }

    pub async fn capture_screenshot(&self, target: &str) -> CaptureOutcome<String> {
        self.attempt(CaptureStage::Screenshot, self.policy.max_retries, move || async move {
            match self.driver.screenshot(target).await {
                Ok(path) if path.trim().is_empty() => Err(AttemptError::Empty(
                    CaptureReasonCode::EmptyValue,
                    "driver returned an empty screenshot path",
                )),
                Ok(path) => Ok(path),
                Err(e) => Err(AttemptError::Driver(e)),
            }
        })
        .await
    }

    /// An empty or blank digest is a failure, not a success with no payload.
    pub async fn capture_dom_signature(&self, target: &str) -> CaptureOutcome<String> {
        self.attempt(CaptureStage::DomSignature, self.policy.max_retries, move || async move {
            match self.driver.dom_signature(target).await {
                Ok(digest) if digest.trim().is_empty() => Err(AttemptError::Empty(
                    CaptureReasonCode::EmptyDomSignature,
                    "DOM signature was empty",
                )),
                Ok(digest) => Ok(digest),
                Err(e) => Err(AttemptError::Driver(e)),
            }
        })
        .await
    }

    pub async fn capture_url(&self) -> CaptureOutcome<String> {
        self.attempt(CaptureStage::Url, self.policy.max_retries, move || async move {
            match self.driver.current_url().await {
                Ok(url) if url.trim().is_empty() => Err(AttemptError::Empty(
                    CaptureReasonCode::EmptyValue,
                    "driver returned an empty URL",
                )),
                Ok(url) => Ok(url),
                Err(e) => Err(AttemptError::Driver(e)),
            }
        })
        .await
    }

    pub async fn snapshot_ui_signals(&self) -> CaptureOutcome<UiSignals> {
        self.attempt(CaptureStage::UiSignals, self.policy.max_retries, move || async move {
            self.driver.ui_signals().await.map_err(AttemptError::Driver)
        })
        .await
    }

    pub async fn stop_network_window(&self) -> CaptureOutcome<NetworkSignals> {
        self.attempt(CaptureStage::NetworkWindow, 0, move || async move {
            self.driver.stop_network_window().await.map_err(AttemptError::Driver)
        })
        .await
    }

    /// Screenshot, URL and DOM signature captured concurrently.
    pub async fn capture_page_state(&self, target: &str) -> PageCapture {
        let (screenshot, url, dom) = futures::join!(
            self.capture_screenshot(target),
            self.capture_url(),
            self.capture_dom_signature(target),
        );

        let mut capture = PageCapture::default();
        capture.snapshot.screenshot = screenshot.value;
        capture.snapshot.url = url.value;
        capture.snapshot.dom_digest = dom.value;
        capture
            .failures
            .extend([screenshot.failure, url.failure, dom.failure].into_iter().flatten());
        capture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyDriver {
        screenshot_failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CaptureDriver for FlakyDriver {
        async fn screenshot(&self, _target: &str) -> anyhow::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.screenshot_failures {
                anyhow::bail!("page crashed")
            }
            Ok("shots/after.png".to_string())
        }
        async fn dom_signature(&self, _target: &str) -> anyhow::Result<String> {
            Ok("   ".to_string())
        }
        async fn current_url(&self) -> anyhow::Result<String> {
            Ok("https://app.example.com/".to_string())
        }
        async fn ui_signals(&self) -> anyhow::Result<UiSignals> {
            Ok(UiSignals::default())
        }
        async fn stop_network_window(&self) -> anyhow::Result<NetworkSignals> {
            anyhow::bail!("window already closed")
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            delay_ms: 1,
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn test_screenshot_recovers_within_retries() {
        let capture = EvidenceCapture::new(FlakyDriver {
            screenshot_failures: 2,
            calls: AtomicU32::new(0),
        })
        .with_policy(fast());
        let out = capture.capture_screenshot("#save").await;
        assert!(out.success);
        assert_eq!(out.value.as_deref(), Some("shots/after.png"));
        assert_eq!(capture.driver().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_screenshot_exhausts_retries() {
        let capture = EvidenceCapture::new(FlakyDriver {
            screenshot_failures: 10,
            calls: AtomicU32::new(0),
        })
        .with_policy(fast());
        let out = capture.capture_screenshot("#save").await;
        assert!(!out.success);
        let failure = out.failure.expect("failure");
        assert_eq!(failure.reason_code, CaptureReasonCode::DriverError);
        assert_eq!(failure.attempt_count, 3);
        assert!(failure.reason.contains("page crashed"));
    }

    #[tokio::test]
    async fn test_empty_dom_signature_is_failure() {
        let capture = EvidenceCapture::new(FlakyDriver {
            screenshot_failures: 0,
            calls: AtomicU32::new(0),
        })
        .with_policy(fast());
        let out = capture.capture_dom_signature("body").await;
        assert!(!out.success);
        assert!(out.value.is_none());
        assert_eq!(
            out.failure.map(|f| f.reason_code),
            Some(CaptureReasonCode::EmptyDomSignature)
        );
    }

    #[tokio::test]
    async fn test_network_window_not_retried() {
        let capture = EvidenceCapture::new(FlakyDriver {
            screenshot_failures: 0,
            calls: AtomicU32::new(0),
        })
        .with_policy(fast());
        let out = capture.stop_network_window().await;
        assert_eq!(out.failure.map(|f| f.attempt_count), Some(1));
    }

    #[tokio::test]
    async fn test_page_state_collects_failures() {
        let capture = EvidenceCapture::new(FlakyDriver {
            screenshot_failures: 0,
            calls: AtomicU32::new(0),
        })
        .with_policy(fast());
        let page = capture.capture_page_state("body").await;
        assert_eq!(page.snapshot.screenshot.as_deref(), Some("shots/after.png"));
        assert_eq!(page.snapshot.url.as_deref(), Some("https://app.example.com/"));
        assert!(page.snapshot.dom_digest.is_none());
        assert_eq!(page.failures.len(), 1);
        assert_eq!(page.failures[0].stage, CaptureStage::DomSignature);
    }
}
