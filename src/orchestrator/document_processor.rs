//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 处理一个 XML 文档及其附件，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **提取指南**：XML → `Vec<GuideRecord>`
//! 2. **匹配附件**：附件 → 指南
//! 3. **逐个提交**：委托 `SubmissionFlow`，两次提交之间由 `RequestPacer` 控制停顿
//! 4. **统计汇总**：成功/失败/未匹配
//!
//! 取消只在两次提交之间和重试等待期间生效，进行中的请求不会被中断

use crate::error::ParseError;
use crate::models::{AttachmentSet, BatchReport, GuideRecord};
use crate::services::{extract_guides, match_attachments, Submitter};
use crate::workflow::submission_flow::failure;
use crate::workflow::{RetryPolicy, SubmissionCtx, SubmissionFlow, CANCELLED};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 批次提交节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub retry: RetryPolicy,
    /// 两次提交之间的停顿，避免压垮远端
    pub request_pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_pause: Duration::from_secs(1),
        }
    }
}

/// 提交节奏控制
///
/// 第一次提交立即放行，之后每次提交前等待 `pause`。
/// 同一个 pacer 可以跨多个文档复用，文档之间同样会停顿
pub struct RequestPacer {
    pause: Duration,
    cancel: CancellationToken,
    started: bool,
}

impl RequestPacer {
    pub fn new(pause: Duration, cancel: CancellationToken) -> Self {
        Self {
            pause,
            cancel,
            started: false,
        }
    }

    /// 等待下一次提交的时机；被取消时返回 false
    pub async fn wait_turn(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = sleep(self.pause) => true,
        }
    }
}

/// 处理单个 XML 文档
///
/// # 参数
/// - `document_name`: 文档名（用于日志）
/// - `xml_text`: XML 内容
/// - `attachments`: 可用的附件
/// - `submitter`: 提交协作者
/// - `options`: 重试与节奏
/// - `cancel`: 取消令牌
///
/// # 返回
/// 文档的处理报告；XML 无法解析时返回 `ParseError`
pub async fn process_batch(
    document_name: &str,
    xml_text: &str,
    attachments: &AttachmentSet,
    submitter: &dyn Submitter,
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> Result<BatchReport, ParseError> {
    let guides = extract_guides(xml_text)?;
    info!("[{}] 找到 {} 个指南", document_name, guides.len());

    let flow = SubmissionFlow::new(submitter, options.retry, cancel.clone());
    let mut pacer = RequestPacer::new(options.request_pause, cancel.clone());

    Ok(submit_guides(document_name, &guides, attachments, &flow, &mut pacer).await)
}

/// 匹配并逐个提交一个文档的指南
///
/// 取消后剩余的配对记为失败（0 次尝试）
pub(crate) async fn submit_guides(
    document_name: &str,
    guides: &[GuideRecord],
    attachments: &AttachmentSet,
    flow: &SubmissionFlow<'_>,
    pacer: &mut RequestPacer,
) -> BatchReport {
    let matched = match_attachments(guides, attachments);
    info!(
        "[{}] 匹配成功 {} 个附件, 未匹配 {} 个",
        document_name,
        matched.pairings.len(),
        matched.unmatched.len()
    );

    let mut report = BatchReport {
        guides_found: guides.len(),
        outcomes: Vec::with_capacity(matched.pairings.len()),
        unmatched: matched.unmatched.iter().map(|u| u.name.clone()).collect(),
    };

    let total = matched.pairings.len();

    for (index, pairing) in matched.pairings.iter().enumerate() {
        if !pacer.wait_turn().await {
            warn!("[{}] ⚠️ 已取消，跳过剩余 {} 个附件", document_name, total - index);
            report.outcomes.extend(
                matched.pairings[index..]
                    .iter()
                    .map(|p| failure(*p, 0, CANCELLED.to_string())),
            );
            break;
        }

        let ctx = SubmissionCtx::new(document_name, index + 1, total);
        let outcome = flow.run(*pairing, &ctx).await;
        report.outcomes.push(outcome);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::GuideRecord;
    use crate::services::SubmitResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录每次调用的指南号，并固定返回 200
    #[derive(Default)]
    struct RecordingSubmitter {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Submitter for RecordingSubmitter {
        async fn submit(
            &self,
            guide: &GuideRecord,
            _document: &[u8],
        ) -> Result<SubmitResponse, TransportError> {
            self.calls.lock().unwrap().push(guide.label().to_string());
            Ok(SubmitResponse {
                status: 200,
                body: "<ok/>".to_string(),
            })
        }
    }

    fn fast_options() -> BatchOptions {
        BatchOptions {
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
            request_pause: Duration::ZERO,
        }
    }

    const XML: &str = r#"<lote>
        <numeroLote>7</numeroLote>
        <guias>
          <guiaConsulta><numeroGuiaPrestador>111</numeroGuiaPrestador></guiaConsulta>
          <guiaConsulta><numeroGuiaPrestador>222</numeroGuiaPrestador></guiaConsulta>
        </guias>
      </lote>"#;

    #[tokio::test]
    async fn test_unmatched_attachment_is_never_submitted() {
        let submitter = RecordingSubmitter::default();
        let attachments: AttachmentSet = vec![("999_doc.pdf", b"%PDF".to_vec())]
            .into_iter()
            .collect();

        let report = process_batch(
            "lote.xml",
            XML,
            &attachments,
            &submitter,
            &fast_options(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.unmatched, vec!["999_doc.pdf".to_string()]);
        assert!(report.outcomes.is_empty());
        assert!(submitter.calls.lock().unwrap().is_empty());
        assert_eq!(report.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_submits_pairings_in_attachment_order() {
        let submitter = RecordingSubmitter::default();
        let attachments: AttachmentSet = vec![
            ("222_doc.pdf", b"%PDF-2".to_vec()),
            ("111_doc.pdf", b"%PDF-1".to_vec()),
        ]
        .into_iter()
        .collect();

        let report = process_batch(
            "lote.xml",
            XML,
            &attachments,
            &submitter,
            &fast_options(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(*submitter.calls.lock().unwrap(), vec!["222", "111"]);
        assert_eq!(report.success_count(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.guide.lot_number.as_deref() == Some("7")));
    }

    #[tokio::test]
    async fn test_cancel_between_submissions() {
        let submitter = RecordingSubmitter::default();
        let attachments: AttachmentSet = vec![
            ("111_doc.pdf", b"%PDF-1".to_vec()),
            ("222_doc.pdf", b"%PDF-2".to_vec()),
        ]
        .into_iter()
        .collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = process_batch(
            "lote.xml",
            XML,
            &attachments,
            &submitter,
            &fast_options(),
            &cancel,
        )
        .await
        .unwrap();

        // 第一个配对在检查点之前，照常提交
        assert_eq!(*submitter.calls.lock().unwrap(), vec!["111"]);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].success);
        assert_eq!(report.outcomes[1].attempts, 0);
        assert_eq!(report.outcomes[1].error.as_deref(), Some(CANCELLED));
    }

    #[tokio::test]
    async fn test_parse_error_is_returned() {
        let submitter = RecordingSubmitter::default();
        let result = process_batch(
            "broken.xml",
            "<lote><guia></lote>",
            &AttachmentSet::new(),
            &submitter,
            &fast_options(),
            &CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_submissions() {
        let submitter = RecordingSubmitter::default();
        let attachments: AttachmentSet = vec![
            ("111_doc.pdf", b"%PDF-1".to_vec()),
            ("222_doc.pdf", b"%PDF-2".to_vec()),
        ]
        .into_iter()
        .collect();
        let options = BatchOptions {
            request_pause: Duration::from_secs(5),
            ..fast_options()
        };

        let start = tokio::time::Instant::now();
        let report = process_batch(
            "lote.xml",
            XML,
            &attachments,
            &submitter,
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.success_count(), 2);
        // 两次提交之间停顿一次
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_pacer() {
        let cancel = CancellationToken::new();
        let mut pacer = RequestPacer::new(Duration::from_secs(3), cancel.clone());

        let start = tokio::time::Instant::now();
        assert!(pacer.wait_turn().await);
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert!(pacer.wait_turn().await);
        assert!(start.elapsed() >= Duration::from_secs(3));

        cancel.cancel();
        assert!(!pacer.wait_turn().await);
    }
}
