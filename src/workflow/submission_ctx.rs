//! 提交上下文
//!
//! 封装"我正在提交哪个文档的第几个附件"这一信息

use std::fmt::Display;

/// 提交上下文（仅用于日志）
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// XML 文档名
    pub document_name: String,

    /// 在本批次中的序号（从1开始）
    pub index: usize,

    /// 本批次的配对总数
    pub total: usize,
}

impl SubmissionCtx {
    /// 创建新的提交上下文
    pub fn new(document_name: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            document_name: document_name.into(),
            index,
            total,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}/{}]", self.document_name, self.index, self.total)
    }
}
