//! 提交能力 - 业务能力层
//!
//! 只描述"把一张指南和它的附件交给远端"，不关心重试和节奏

use crate::error::TransportError;
use crate::models::GuideRecord;
use async_trait::async_trait;

/// 远端返回的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

impl SubmitResponse {
    /// 远端是否接受了该文档
    pub fn is_accepted(&self) -> bool {
        self.status == 200
    }
}

/// 提交协作者
///
/// 收到任何响应都返回 `Ok`（包括非 200 状态码）；
/// 只有请求没有得到响应时才返回 `TransportError`
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        guide: &GuideRecord,
        document: &[u8],
    ) -> Result<SubmitResponse, TransportError>;
}
