//! TISS `envioDocumentoWS` SOAP 报文
//!
//! 只负责拼装报文文本，不做协议层面的校验

use chrono::NaiveDateTime;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// TISS 标准版本
pub const TISS_STANDARD: &str = "4.01.00";

/// SOAPAction 请求头
pub const SOAP_ACTION: &str = "http://www.ans.gov.br/padroes/tiss/schemas/envioDocumentoWS";

/// 机构登录信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub provider_code: String,
    pub login: String,
    /// 小写十六进制 MD5
    pub password_md5: String,
    pub ans_registry: String,
}

impl ProviderCredentials {
    pub fn new(
        provider_code: impl Into<String>,
        login: impl Into<String>,
        password: &str,
        ans_registry: impl Into<String>,
    ) -> Self {
        Self {
            provider_code: provider_code.into(),
            login: login.into(),
            password_md5: normalize_password(password),
            ans_registry: ans_registry.into(),
        }
    }
}

/// 32 位十六进制的 MD5 摘要
static MD5_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Fa-f0-9]{32}$").expect("MD5 pattern is valid"));

/// 已经是 32 位十六进制则视为 MD5 直接使用，否则计算 MD5
pub fn normalize_password(raw: &str) -> String {
    let password = raw.trim();
    if MD5_HEX.is_match(password) {
        password.to_lowercase()
    } else {
        format!("{:x}", md5::compute(password.as_bytes()))
    }
}

/// 单个文档的报文字段，缺失的字段传空字符串
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeFields<'a> {
    pub lot_number: &'a str,
    pub protocol_number: &'a str,
    pub provider_guide_number: &'a str,
    pub operator_guide_number: &'a str,
    pub document_number: &'a str,
    /// base64 编码的 PDF
    pub document_base64: &'a str,
    pub guide_nature: &'a str,
    pub document_type: &'a str,
    pub observation: &'a str,
}

/// 构建 SOAP 报文
///
/// # 参数
/// - `credentials`: 机构登录信息
/// - `fields`: 文档字段
/// - `now`: 交易时间（写入 dataRegistroTransacao / horaRegistroTransacao）
pub fn build_envelope(
    credentials: &ProviderCredentials,
    fields: &EnvelopeFields<'_>,
    now: NaiveDateTime,
) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas"
xmlns:xd="http://www.w3.org/2000/09/xmldsig#">
<soapenv:Header/>
<soapenv:Body>
<ans:envioDocumentoWS>
<ans:cabecalho>
<ans:identificacaoTransacao>
<ans:tipoTransacao>ENVIO_DOCUMENTO</ans:tipoTransacao>
<ans:sequencialTransacao>1</ans:sequencialTransacao>
<ans:dataRegistroTransacao>{date}</ans:dataRegistroTransacao>
<ans:horaRegistroTransacao>{time}</ans:horaRegistroTransacao>
</ans:identificacaoTransacao>
<ans:origem>
<ans:identificacaoPrestador>
<ans:codigoPrestadorNaOperadora>{provider_code}</ans:codigoPrestadorNaOperadora>
</ans:identificacaoPrestador>
</ans:origem>
<ans:destino>
<ans:registroANS>{ans_registry}</ans:registroANS>
</ans:destino>
<ans:Padrao>{standard}</ans:Padrao>
<ans:loginSenhaPrestador>
<ans:loginPrestador>{login}</ans:loginPrestador>
<ans:senhaPrestador>{password}</ans:senhaPrestador>
</ans:loginSenhaPrestador>
</ans:cabecalho>
<ans:envioDOcumento>
<ans:numeroLote>{lot}</ans:numeroLote>
<ans:numeroProtocolo>{protocol}</ans:numeroProtocolo>
<ans:numeroGuiaPrestador>{provider_guide}</ans:numeroGuiaPrestador>
<ans:numeroGuiaOperadora>{operator_guide}</ans:numeroGuiaOperadora>
<ans:numeroDocumento>{document_number}</ans:numeroDocumento>
<ans:naturezaGuia>{nature}</ans:naturezaGuia>
<ans:formatoDocumento>02</ans:formatoDocumento>
<ans:documento>{document}</ans:documento>
<ans:tipoDocumento>{document_type}</ans:tipoDocumento>
<ans:observacao>{observation}</ans:observacao>
</ans:envioDOcumento>
<ans:hash>2</ans:hash>
</ans:envioDocumentoWS>
</soapenv:Body>
</soapenv:Envelope>"#,
        date = now.format("%Y-%m-%d"),
        time = now.format("%H:%M:%S"),
        provider_code = escape_xml(&credentials.provider_code),
        ans_registry = escape_xml(&credentials.ans_registry),
        standard = TISS_STANDARD,
        login = escape_xml(&credentials.login),
        password = credentials.password_md5,
        lot = escape_xml(fields.lot_number),
        protocol = escape_xml(fields.protocol_number),
        provider_guide = escape_xml(fields.provider_guide_number),
        operator_guide = escape_xml(fields.operator_guide_number),
        document_number = escape_xml(fields.document_number),
        nature = escape_xml(fields.guide_nature),
        document = fields.document_base64,
        document_type = escape_xml(fields.document_type),
        observation = escape_xml(fields.observation),
    )
}

fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.contains(&['&', '<', '>', '"', '\''][..]) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
