//! 指南提取服务 - 业务能力层
//!
//! 从一个 TISS 批次 XML 中找出所有"指南"元素并提取字段。
//!
//! ## 规则
//!
//! - 忽略命名空间：所有比较之前都先经过 [`local_name`]
//! - 标签匹配不区分大小写，并且按子串包含判断
//! - 只含空白的文本视为不存在
//! - 遍历顺序为文档顺序（前序）

use crate::error::ParseError;
use crate::models::GuideRecord;
use roxmltree::{Document, Node};
use tracing::debug;

/// 候选元素标签必须包含的子串
const GUIDE_TAG: &str = "guia";

/// 候选元素子树中至少要有一个带文本的标签包含以下子串之一
const GUIDE_MARKERS: [&str; 3] = ["numeroguia", "numerocarteira", "carteirinha"];

/// 文档级批次号标签
const LOT_TAG: &str = "numerolote";

/// 去掉命名空间（`{uri}tag` 或 `prefix:tag`）并转为小写
pub fn local_name(tag: &str) -> String {
    let without_uri = match tag.rfind('}') {
        Some(pos) => &tag[pos + 1..],
        None => tag,
    };
    let local = match without_uri.rfind(':') {
        Some(pos) => &without_uri[pos + 1..],
        None => without_uri,
    };
    local.to_lowercase()
}

/// 从 XML 文本中提取所有有效指南
///
/// # 参数
/// - `xml_text`: 完整的批次 XML
///
/// # 返回
/// 按文档顺序排列的指南；XML 格式错误时返回 `ParseError`
pub fn extract_guides(xml_text: &str) -> Result<Vec<GuideRecord>, ParseError> {
    let doc = Document::parse(xml_text)?;
    let root = doc.root_element();

    let lot_number = extract_lot_number(root);
    debug!("批次号: {:?}", lot_number);

    let candidates = find_guide_candidates(root);
    debug!("找到 {} 个候选指南元素", candidates.len());

    let mut guides = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut guide = extract_guide_fields(candidate);
        if !guide.is_valid() {
            debug!(
                "丢弃没有指南号的元素 <{}>",
                candidate.tag_name().name()
            );
            continue;
        }
        guide.lot_number = lot_number.clone();
        guides.push(guide);
    }

    Ok(guides)
}

/// 文档中第一个非空的 `numeroLote`
fn extract_lot_number(root: Node) -> Option<String> {
    elements(root)
        .filter(|node| element_local_name(*node) == LOT_TAG)
        .find_map(element_text)
}

/// 找出所有候选指南元素（包括根元素），按文档顺序
///
/// 前序遍历中每个节点只访问一次，所以每个元素最多被收录一次；
/// 嵌套的候选元素会各自产生记录
fn find_guide_candidates<'a, 'input>(root: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    elements(root)
        .filter(|node| element_local_name(*node).contains(GUIDE_TAG))
        .filter(|node| has_guide_marker(*node))
        .collect()
}

/// 元素自身或其后代中是否有带文本的指南号/卡号标签
fn has_guide_marker(node: Node) -> bool {
    elements(node).any(|child| {
        let tag = element_local_name(child);
        GUIDE_MARKERS.iter().any(|marker| tag.contains(marker)) && element_text(child).is_some()
    })
}

/// 指南字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuideField {
    ProviderGuideNumber,
    OperatorGuideNumber,
    Card,
    Protocol,
    BeneficiaryName,
    DocumentNumber,
}

/// 根据标签判断字段
///
/// 顺序很重要：`numeroguiaprestador` / `numeroguiaoperadora` 必须先于
/// 通用的 `numeroguia` 判断
fn classify(tag: &str, provider_set: bool) -> Option<GuideField> {
    if tag.contains("numeroguiaprestador") {
        Some(GuideField::ProviderGuideNumber)
    } else if tag.contains("numeroguiaoperadora") {
        Some(GuideField::OperatorGuideNumber)
    } else if tag.contains("numeroguia") && !provider_set {
        Some(GuideField::ProviderGuideNumber)
    } else if tag.contains("numerocarteira") || tag.contains("carteirinha") {
        Some(GuideField::Card)
    } else if tag.contains("numeroprotocolo") || tag.contains("protocolo") {
        Some(GuideField::Protocol)
    } else if tag.contains("nomebeneficiario") {
        Some(GuideField::BeneficiaryName)
    } else if tag.contains("numerodocumento") {
        Some(GuideField::DocumentNumber)
    } else {
        None
    }
}

/// 遍历候选元素子树，填充字段
fn extract_guide_fields(candidate: Node) -> GuideRecord {
    let mut guide = GuideRecord::default();

    for node in elements(candidate) {
        let Some(text) = element_text(node) else {
            continue;
        };
        let tag = element_local_name(node);

        match classify(&tag, guide.provider_guide_number.is_some()) {
            Some(GuideField::ProviderGuideNumber) => guide.provider_guide_number = Some(text),
            Some(GuideField::OperatorGuideNumber) => guide.operator_guide_number = Some(text),
            Some(GuideField::Card) => {
                guide.card_display = Some(text.clone());
                guide.card_number = Some(text);
            }
            Some(GuideField::Protocol) => guide.protocol_number = Some(text),
            Some(GuideField::BeneficiaryName) => guide.beneficiary_name = Some(text),
            Some(GuideField::DocumentNumber) => guide.document_number = Some(text),
            None => {}
        }
    }

    if guide.document_number.is_none() {
        if let Some(provider) = &guide.provider_guide_number {
            guide.document_number = Some(format!("{}001", provider));
        }
    }

    guide
}

// ========== 树遍历辅助函数 ==========

/// 节点自身及其所有后代中的元素，前序
fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(|n| n.is_element())
}

fn element_local_name(node: Node) -> String {
    local_name(node.tag_name().name())
}

/// 元素的直接文本（第一个子元素之前的文本），去除空白，空则为 None
fn element_text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
