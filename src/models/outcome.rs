use crate::models::attachment::AttachmentRef;
use crate::models::guide::GuideRecord;
use serde::Serialize;

/// 附件未找到对应指南时的原因
pub const GUIDE_NOT_FOUND: &str = "guide not found";

/// 一次匹配的结果：指南 <-> 附件
#[derive(Debug, Clone, Copy)]
pub struct Pairing<'a> {
    pub guide: &'a GuideRecord,
    pub attachment: &'a AttachmentRef,
}

/// 没有匹配到任何指南的附件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedAttachment {
    pub name: String,
    pub reason: String,
}

impl UnmatchedAttachment {
    pub fn guide_not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: GUIDE_NOT_FOUND.to_string(),
        }
    }
}

/// 单个指南的提交结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub guide: GuideRecord,
    pub attachment_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一个 XML 文档的处理报告
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub guides_found: usize,
    pub outcomes: Vec<SubmissionOutcome>,
    pub unmatched: Vec<String>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// 失败数：提交失败 + 未匹配的附件
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count() + self.unmatched.len()
    }
}
