//! # TISS Submit
//!
//! 把 TISS 批次 XML 中的指南与 PDF 附件配对，并通过 SOAP 提交给保险方
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP Client），只暴露能力
//! - `HttpTransport` - 唯一的 client owner，提供 post() 能力
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/guide_extractor` - 忽略命名空间的指南提取
//! - `services/attachment_matcher` - 根据文件名把附件匹配到指南
//! - `services/submitter` - 提交协作者（trait）
//! - `clients/` - SOAP 报文与 Orizon 客户端（`Submitter` 的实现）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个配对"的提交流程
//! - `SubmissionCtx` - 上下文封装（文档名 + 序号）
//! - `SubmissionFlow` - 有限次重试，固定间隔
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 目录级处理器，逐个文档处理并汇总
//! - `orchestrator/document_processor` - 单个文档：提取 → 匹配 → 提交

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::OrizonClient;
pub use config::Config;
pub use error::{AppError, AppResult, ParseError, TransportError};
pub use infrastructure::HttpTransport;
pub use models::{
    AttachmentRef, AttachmentSet, BatchReport, GuideRecord, Pairing, SubmissionOutcome,
    UnmatchedAttachment,
};
pub use orchestrator::{process_batch, App, BatchOptions, RunSummary};
pub use services::{extract_guides, local_name, match_attachments, SubmitResponse, Submitter};
pub use workflow::{RetryPolicy, SubmissionCtx, SubmissionFlow};
