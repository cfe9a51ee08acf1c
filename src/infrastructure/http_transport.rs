//! HTTP 传输 - 基础设施层
//!
//! 持有唯一的 reqwest Client，只暴露"POST 一段字节并取回响应"的能力

use crate::error::TransportError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// 收到的原始 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP 传输
///
/// 职责：
/// - 持有唯一的 Client（连接池）
/// - 暴露 post() 能力
/// - 不认识指南 / 附件
/// - 不处理重试
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// 创建新的 HTTP 传输
    ///
    /// # 参数
    /// - `timeout`: 单次请求超时（包括读取响应体）
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// 发送 POST 请求
    ///
    /// # 参数
    /// - `url`: 目标地址
    /// - `headers`: 额外的请求头
    /// - `body`: 请求体
    ///
    /// # 返回
    /// 收到响应即返回状态码和响应体；连接失败、超时等返回 `TransportError`
    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("POST {} -> {} ({} 字节)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}
