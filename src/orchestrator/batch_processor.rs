//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责目录级别的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化日志文件、创建 `OrizonClient`
//! 2. **批量加载**：扫描目录中的 XML 文档和 PDF 附件
//! 3. **目录级匹配**：每个附件只归属第一个能匹配它的文档，不会被重复提交
//! 4. **逐个处理**：委托 `document_processor` 提交单个文档，请求节奏跨文档保持
//! 5. **错误隔离**：一个文档解析失败只记录，不影响其他文档
//! 6. **全局统计**：汇总结果并写出 JSON 报告

use crate::clients::OrizonClient;
use crate::config::Config;
use crate::error::{AppError, ParseError};
use crate::models::{load_batch_folder, AttachmentSet, BatchReport, GuideRecord};
use crate::orchestrator::document_processor::{submit_guides, RequestPacer};
use crate::services::{extract_guides, find_guide, Submitter};
use crate::utils::logging::{
    init_log_file, log_document_complete, log_document_start, log_documents_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::SubmissionFlow;
use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 单个文档的处理结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub documents: Vec<DocumentResult>,
    /// 目录中没有任何指南能匹配的附件
    pub unmatched: Vec<String>,
}

impl RunSummary {
    pub fn success_count(&self) -> usize {
        self.documents
            .iter()
            .filter_map(|d| d.report.as_ref())
            .map(BatchReport::success_count)
            .sum()
    }

    /// 失败数：各文档的失败 + 无法解析的文档 + 未匹配的附件
    pub fn failure_count(&self) -> usize {
        let documents: usize = self
            .documents
            .iter()
            .map(|d| match &d.report {
                Some(report) => report.failure_count(),
                None => 1,
            })
            .sum();
        documents + self.unmatched.len()
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    submitter: Box<dyn Submitter>,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let client = OrizonClient::new(&config).context("无法创建 HTTP 客户端")?;
        Self::with_submitter(config, Box::new(client))
    }

    /// 使用自定义提交者初始化
    pub fn with_submitter(config: Config, submitter: Box<dyn Submitter>) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.endpoint_url, config.max_attempts);

        Ok(Self {
            config,
            submitter,
            cancel: CancellationToken::new(),
        })
    }

    /// 取消令牌，用于优雅退出
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        info!("\n📁 正在扫描待处理的文档: {}", self.config.input_folder);
        let batch = load_batch_folder(&self.config.input_folder).await?;

        if batch.documents.is_empty() {
            warn!("⚠️ 没有找到待处理的XML文件，程序结束");
            return Ok(RunSummary::default());
        }

        log_documents_loaded(batch.documents.len(), batch.attachments.len());

        // 先解析全部文档，附件在整个目录范围内匹配
        let parsed: Vec<Result<Vec<GuideRecord>, ParseError>> = batch
            .documents
            .iter()
            .map(|document| extract_guides(&document.content))
            .collect();
        let (scoped, unmatched) = assign_attachments(&parsed, batch.attachments);

        let options = self.config.batch_options();
        let flow = SubmissionFlow::new(self.submitter.as_ref(), options.retry, self.cancel.clone());
        let mut pacer = RequestPacer::new(options.request_pause, self.cancel.clone());
        let total = batch.documents.len();
        let mut summary = RunSummary {
            documents: Vec::with_capacity(total),
            unmatched,
        };

        for (idx, ((document, guides), attachments)) in batch
            .documents
            .iter()
            .zip(&parsed)
            .zip(&scoped)
            .enumerate()
        {
            if self.cancel.is_cancelled() {
                warn!("⚠️ 已取消，剩余 {} 个文档未处理", total - idx);
                break;
            }

            log_document_start(idx + 1, total, &document.name);

            let result = match guides {
                Ok(guides) => {
                    info!("[{}] 找到 {} 个指南", document.name, guides.len());
                    let report =
                        submit_guides(&document.name, guides, attachments, &flow, &mut pacer).await;
                    log_document_complete(
                        &document.name,
                        report.guides_found,
                        report.success_count(),
                        report.failure_count(),
                    );
                    DocumentResult {
                        document: document.name.clone(),
                        report: Some(report),
                        error: None,
                    }
                }
                Err(e) => {
                    error!("[{}] ❌ {}", document.name, e);
                    DocumentResult {
                        document: document.name.clone(),
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            summary.documents.push(result);
        }

        self.write_report(&summary)?;

        print_final_stats(
            summary.success_count(),
            summary.failure_count(),
            &self.config.output_log_file,
        );

        Ok(summary)
    }

    /// 写出 JSON 报告（如果配置了路径）
    fn write_report(&self, summary: &RunSummary) -> Result<()> {
        let Some(path) = &self.config.report_file else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(path, json).map_err(|e| AppError::file_write_failed(path, e))?;
        info!("📝 报告已写入: {}", path);
        Ok(())
    }
}

/// 把目录中的附件分配给文档
///
/// 每个附件归属第一个有指南能匹配它的文档（按文档顺序）；
/// 无法解析的文档不参与分配。
///
/// # 返回
/// 与 `parsed` 一一对应的附件集合，以及所有文档都匹配不到的附件名
fn assign_attachments(
    parsed: &[Result<Vec<GuideRecord>, ParseError>],
    attachments: AttachmentSet,
) -> (Vec<AttachmentSet>, Vec<String>) {
    let mut scoped = vec![AttachmentSet::new(); parsed.len()];
    let mut unmatched = Vec::new();

    for attachment in attachments {
        let owner = parsed.iter().position(|guides| {
            guides
                .as_ref()
                .is_ok_and(|guides| find_guide(guides, &attachment).is_some())
        });
        match owner {
            Some(idx) => scoped[idx].push(attachment),
            None => {
                warn!("⚠️ 附件 {} 在所有文档中都未找到对应指南", attachment.name);
                unmatched.push(attachment.name);
            }
        }
    }

    (scoped, unmatched)
}
