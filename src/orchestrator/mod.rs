//! 编排层
//!
//! - `batch_processor`: 目录级别，持有提交者并逐个处理文档
//! - `document_processor`: 单个 XML 文档的提取、匹配与提交

pub mod batch_processor;
pub mod document_processor;

pub use batch_processor::{App, DocumentResult, RunSummary};
pub use document_processor::{process_batch, BatchOptions, RequestPacer};
