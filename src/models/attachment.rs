use indexmap::IndexMap;

/// 随 XML 批次一起提供的附件（PDF）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// 文件名中第一个 `_` 之前的部分，用来定位所属指南
    ///
    /// `357609997_GUIA_doc1.pdf` -> `357609997`
    pub fn guide_token(&self) -> &str {
        self.name.split('_').next().unwrap_or_default().trim()
    }
}

/// 文件名 -> 附件，保持插入顺序
///
/// 同名附件后插入的覆盖先插入的，但位置不变
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    items: IndexMap<String, AttachmentRef>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.push(AttachmentRef::new(name, bytes));
    }

    pub fn push(&mut self, attachment: AttachmentRef) {
        self.items.insert(attachment.name.clone(), attachment);
    }

    pub fn get(&self, name: &str) -> Option<&AttachmentRef> {
        self.items.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttachmentRef> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for AttachmentSet {
    type Item = AttachmentRef;
    type IntoIter = indexmap::map::IntoValues<String, AttachmentRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<u8>)> for AttachmentSet {
    fn from_iter<I: IntoIterator<Item = (N, Vec<u8>)>>(iter: I) -> Self {
        let mut set = AttachmentSet::new();
        for (name, bytes) in iter {
            set.insert(name, bytes);
        }
        set
    }
}
