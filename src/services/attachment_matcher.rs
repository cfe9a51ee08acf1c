/// 附件匹配服务
///
/// 根据 PDF 文件名找到它所属的指南
use crate::models::{AttachmentRef, AttachmentSet, GuideRecord, Pairing, UnmatchedAttachment};
use tracing::{debug, warn};

/// 一次匹配的结果
#[derive(Debug, Default)]
pub struct MatchReport<'a> {
    pub pairings: Vec<Pairing<'a>>,
    pub unmatched: Vec<UnmatchedAttachment>,
}

/// 为每个附件寻找指南
///
/// # 参数
/// - `guides`: 按提取顺序排列的指南
/// - `attachments`: 附件集合（按插入顺序遍历）
///
/// # 返回
/// 每个附件最多对应一个指南（第一个命中的）；已匹配的指南仍可被后续附件命中
pub fn match_attachments<'a>(
    guides: &'a [GuideRecord],
    attachments: &'a AttachmentSet,
) -> MatchReport<'a> {
    let mut report = MatchReport::default();

    for attachment in attachments.iter() {
        match find_guide(guides, attachment) {
            Some(guide) => {
                debug!("附件 {} -> 指南 {}", attachment.name, guide.label());
                report.pairings.push(Pairing { guide, attachment });
            }
            None => {
                warn!("⚠️ 附件 {} 未找到对应指南", attachment.name);
                report
                    .unmatched
                    .push(UnmatchedAttachment::guide_not_found(&attachment.name));
            }
        }
    }

    report
}

/// 按提取顺序扫描，返回第一个命中的指南
pub fn find_guide<'a>(guides: &'a [GuideRecord], attachment: &AttachmentRef) -> Option<&'a GuideRecord> {
    let token = attachment.guide_token();
    if token.is_empty() {
        return None;
    }
    guides.iter().find(|guide| token_matches(token, guide))
}

/// token 与指南号的匹配规则
///
/// 依次判断：完全相等、token 是指南号的子串、指南号以 token 结尾。
/// 只判断 token ⊆ 指南号，不反过来
fn token_matches(token: &str, guide: &GuideRecord) -> bool {
    let provider = guide.provider_guide_number.as_deref();
    let operator = guide.operator_guide_number.as_deref();

    provider == Some(token)
        || operator == Some(token)
        || provider.is_some_and(|p| p.contains(token))
        || operator.is_some_and(|o| o.contains(token))
        || provider.is_some_and(|p| p.ends_with(token))
        || operator.is_some_and(|o| o.ends_with(token))
}
