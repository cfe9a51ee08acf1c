use serde::{Deserialize, Serialize};

/// 批次 XML 中的一张指南（guia）
///
/// 提取完成后不再修改，匹配和提交阶段只借用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideRecord {
    /// 批次号，同一文档中的所有指南共享
    pub lot_number: Option<String>,
    pub provider_guide_number: Option<String>,
    pub operator_guide_number: Option<String>,
    /// 保险卡号
    pub card_number: Option<String>,
    /// 卡号的展示别名（只用于显示）
    #[serde(rename = "carteirinha")]
    pub card_display: Option<String>,
    pub protocol_number: Option<String>,
    pub beneficiary_name: Option<String>,
    pub document_number: Option<String>,
}

impl GuideRecord {
    /// 至少有一个指南号（去除空白后非空）才是有效记录
    pub fn is_valid(&self) -> bool {
        has_text(&self.provider_guide_number) || has_text(&self.operator_guide_number)
    }

    /// 日志里用来标识这张指南的编号
    pub fn label(&self) -> &str {
        self.provider_guide_number
            .as_deref()
            .or(self.operator_guide_number.as_deref())
            .unwrap_or("-")
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
