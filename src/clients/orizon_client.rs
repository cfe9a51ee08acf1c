/// Orizon TISS 文档服务客户端
///
/// 把指南字段和 PDF 装进 SOAP 报文并发送
use crate::clients::soap_envelope::{
    build_envelope, EnvelopeFields, ProviderCredentials, SOAP_ACTION,
};
use crate::config::Config;
use crate::error::TransportError;
use crate::infrastructure::HttpTransport;
use crate::models::GuideRecord;
use crate::services::{SubmitResponse, Submitter};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::time::Duration;
use tracing::debug;

/// Orizon 客户端
pub struct OrizonClient {
    transport: HttpTransport,
    endpoint_url: String,
    credentials: ProviderCredentials,
    guide_nature: String,
    document_type: String,
}

impl OrizonClient {
    /// 创建新的 Orizon 客户端
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        Ok(Self {
            transport: HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?,
            endpoint_url: config.endpoint_url.clone(),
            credentials: ProviderCredentials::new(
                config.provider_code.clone(),
                config.login.clone(),
                &config.password,
                config.ans_registry.clone(),
            ),
            guide_nature: config.guide_nature.clone(),
            document_type: config.document_type.clone(),
        })
    }

    /// 为一张指南构建报文
    fn build_request_body(&self, guide: &GuideRecord, document: &[u8]) -> String {
        let document_base64 = STANDARD.encode(document);
        let fields = EnvelopeFields {
            lot_number: guide.lot_number.as_deref().unwrap_or_default(),
            protocol_number: guide.protocol_number.as_deref().unwrap_or_default(),
            provider_guide_number: guide.provider_guide_number.as_deref().unwrap_or_default(),
            operator_guide_number: guide.operator_guide_number.as_deref().unwrap_or_default(),
            document_number: guide.document_number.as_deref().unwrap_or_default(),
            document_base64: &document_base64,
            guide_nature: &self.guide_nature,
            document_type: &self.document_type,
            observation: "",
        };
        build_envelope(&self.credentials, &fields, chrono::Local::now().naive_local())
    }
}

#[async_trait]
impl Submitter for OrizonClient {
    async fn submit(
        &self,
        guide: &GuideRecord,
        document: &[u8],
    ) -> Result<SubmitResponse, TransportError> {
        let body = self.build_request_body(guide, document);
        debug!(
            "发送指南 {} 报文 ({} 字节)",
            guide.label(),
            body.len()
        );

        let response = self
            .transport
            .post(
                &self.endpoint_url,
                &[
                    ("Content-Type", "text/xml; charset=utf-8"),
                    ("SOAPAction", SOAP_ACTION),
                ],
                body.into_bytes(),
            )
            .await?;

        Ok(SubmitResponse {
            status: response.status,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint_url: String) -> Config {
        Config {
            endpoint_url,
            provider_code: "0000263036".to_string(),
            login: "LAB0186".to_string(),
            password: "secret".to_string(),
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    fn test_guide() -> GuideRecord {
        GuideRecord {
            lot_number: Some("10".to_string()),
            provider_guide_number: Some("123".to_string()),
            document_number: Some("123001".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_posts_soap_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Service.asmx"))
            .and(header("SOAPAction", SOAP_ACTION))
            .and(body_string_contains("<ans:numeroGuiaPrestador>123</ans:numeroGuiaPrestador>"))
            .and(body_string_contains("<ans:documento>JVBERg==</ans:documento>"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ok/>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            OrizonClient::new(&test_config(format!("{}/Service.asmx", mock_server.uri()))).unwrap();
        let response = client.submit(&test_guide(), b"%PDF").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<ok/>");
        assert!(response.is_accepted());
    }

    #[tokio::test]
    async fn test_server_error_is_a_response_not_a_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("fault"))
            .mount(&mock_server)
            .await;

        let client = OrizonClient::new(&test_config(mock_server.uri())).unwrap();
        let response = client.submit(&test_guide(), b"%PDF").await;

        let response = tokio_test::assert_ok!(response);
        assert_eq!(response.status, 500);
        assert!(!response.is_accepted());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // 端口 9 (discard) 通常无人监听
        let client = OrizonClient::new(&test_config("http://127.0.0.1:9/".to_string())).unwrap();
        let result = client.submit(&test_guide(), b"%PDF").await;
        assert!(result.is_err());
    }
}
