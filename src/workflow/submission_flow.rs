//! 单个指南的提交流程 - 流程层
//!
//! 核心职责：一个 (指南, 附件) 配对 → 有限次重试 → 提交结果
//!
//! 流程规则：
//! 1. 最多尝试 `max_attempts` 次，第 2 次起每次之前固定等待 `backoff`
//! 2. 只有传输错误才重试
//! 3. 收到任何响应（包括非 200）立即结束

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::{Pairing, SubmissionOutcome};
use crate::services::{SubmitResponse, Submitter};
use crate::utils::logging::{truncate_chars, truncate_text};
use crate::workflow::submission_ctx::SubmissionCtx;

/// 错误信息在报告中保留的最大字符数
pub const MAX_ERROR_CHARS: usize = 100;

/// 取消时写入结果的错误信息
pub const CANCELLED: &str = "cancelled";

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// 固定间隔，不做指数退避
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// 提交流程
///
/// - 编排单个配对的重试
/// - 不持有任何资源，只依赖 `Submitter`
/// - 同一指南的尝试严格串行
pub struct SubmissionFlow<'a> {
    submitter: &'a dyn Submitter,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<'a> SubmissionFlow<'a> {
    /// 创建新的提交流程
    pub fn new(submitter: &'a dyn Submitter, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            submitter,
            policy,
            cancel,
        }
    }

    pub async fn run(&self, pairing: Pairing<'_>, ctx: &SubmissionCtx) -> SubmissionOutcome {
        let guide = pairing.guide;
        info!(
            "{} 📤 提交指南 {} (附件: {})",
            ctx,
            guide.label(),
            pairing.attachment.name
        );

        let mut last_error: Option<String> = None;
        let mut attempts = 0;

        while attempts < self.policy.max_attempts {
            if attempts > 0 && !self.wait_backoff().await {
                warn!("{} ⚠️ 重试等待期间被取消 (已尝试 {} 次)", ctx, attempts);
                return failure(pairing, attempts, CANCELLED.to_string());
            }
            attempts += 1;

            match self
                .submitter
                .submit(guide, &pairing.attachment.bytes)
                .await
            {
                Ok(response) => {
                    return self.outcome_from_response(pairing, ctx, response, attempts);
                }
                Err(e) => {
                    let message = truncate_chars(&e.message, MAX_ERROR_CHARS);
                    warn!(
                        "{} ⚠️ 传输失败 (尝试 {}/{}): {}",
                        ctx, attempts, self.policy.max_attempts, message
                    );
                    last_error = Some(message);
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| "no attempt made".to_string());
        warn!(
            "{} ❌ 指南 {} 在 {} 次尝试后仍然失败",
            ctx,
            guide.label(),
            attempts
        );
        failure(
            pairing,
            attempts,
            format!(
                "failed after {} attempts, last error: {}",
                attempts, last_error
            ),
        )
    }

    /// 收到响应即为最终结果，不再重试
    fn outcome_from_response(
        &self,
        pairing: Pairing<'_>,
        ctx: &SubmissionCtx,
        response: SubmitResponse,
        attempts: u32,
    ) -> SubmissionOutcome {
        let success = response.is_accepted();
        if success {
            info!("{} ✓ 提交成功 (HTTP {}, 尝试 {} 次)", ctx, response.status, attempts);
        } else {
            warn!(
                "{} ⚠️ 远端拒绝 (HTTP {}): {}",
                ctx,
                response.status,
                truncate_text(&response.body, 200)
            );
        }

        SubmissionOutcome {
            guide: pairing.guide.clone(),
            attachment_name: pairing.attachment.name.clone(),
            success,
            http_status: Some(response.status),
            raw_response: Some(response.body),
            attempts,
            error: None,
        }
    }

    /// 等待重试间隔；被取消时返回 false
    async fn wait_backoff(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = sleep(self.policy.backoff) => true,
        }
    }
}

/// 构建失败结果
pub(crate) fn failure(pairing: Pairing<'_>, attempts: u32, error: String) -> SubmissionOutcome {
    SubmissionOutcome {
        guide: pairing.guide.clone(),
        attachment_name: pairing.attachment.name.clone(),
        success: false,
        http_status: None,
        raw_response: None,
        attempts,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::{AttachmentRef, GuideRecord};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// 按脚本依次返回结果的提交者
    struct ScriptedSubmitter {
        script: Mutex<VecDeque<Result<SubmitResponse, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedSubmitter {
        fn new(script: Vec<Result<SubmitResponse, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Submitter for ScriptedSubmitter {
        async fn submit(
            &self,
            _guide: &GuideRecord,
            _document: &[u8],
        ) -> Result<SubmitResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("script exhausted")))
        }
    }

    fn ok(status: u16) -> Result<SubmitResponse, TransportError> {
        Ok(SubmitResponse {
            status,
            body: format!("<status>{}</status>", status),
        })
    }

    fn transport_err(message: &str) -> Result<SubmitResponse, TransportError> {
        Err(TransportError::new(message))
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    fn fixture() -> (GuideRecord, AttachmentRef) {
        (
            GuideRecord {
                provider_guide_number: Some("123".to_string()),
                ..Default::default()
            },
            AttachmentRef::new("123_doc.pdf", b"%PDF".to_vec()),
        )
    }

    fn ctx() -> SubmissionCtx {
        SubmissionCtx::new("lote.xml", 1, 1)
    }

    #[tokio::test]
    async fn test_retries_transport_errors_then_succeeds() {
        let submitter = ScriptedSubmitter::new(vec![
            transport_err("connection reset"),
            transport_err("timed out"),
            ok(200),
        ]);
        let (guide, attachment) = fixture();
        let flow = SubmissionFlow::new(&submitter, fast_policy(), CancellationToken::new());

        let outcome = flow
            .run(Pairing { guide: &guide, attachment: &attachment }, &ctx())
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(submitter.calls(), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let submitter = ScriptedSubmitter::new(vec![ok(500), ok(200)]);
        let (guide, attachment) = fixture();
        let flow = SubmissionFlow::new(&submitter, fast_policy(), CancellationToken::new());

        let outcome = flow
            .run(Pairing { guide: &guide, attachment: &attachment }, &ctx())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.http_status, Some(500));
        assert_eq!(outcome.raw_response.as_deref(), Some("<status>500</status>"));
        assert_eq!(submitter.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_report_truncated_error() {
        let long_message = "x".repeat(250);
        let submitter = ScriptedSubmitter::new(vec![
            transport_err("first"),
            transport_err("second"),
            transport_err(&long_message),
        ]);
        let (guide, attachment) = fixture();
        let flow = SubmissionFlow::new(&submitter, fast_policy(), CancellationToken::new());

        let outcome = flow
            .run(Pairing { guide: &guide, attachment: &attachment }, &ctx())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.http_status, None);
        let error = outcome.error.unwrap();
        assert_eq!(
            error,
            format!("failed after 3 attempts, last error: {}", "x".repeat(100))
        );
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_stops_retrying() {
        let submitter = ScriptedSubmitter::new(vec![transport_err("down"), ok(200)]);
        let (guide, attachment) = fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let flow = SubmissionFlow::new(&submitter, fast_policy(), cancel);

        let outcome = flow
            .run(Pairing { guide: &guide, attachment: &attachment }, &ctx())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.error.as_deref(), Some(CANCELLED));
        assert_eq!(submitter.calls(), 1);
    }
}
