use crate::error::FileError;
use crate::models::attachment::AttachmentSet;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 待处理的 XML 文档
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub name: String,
    pub content: String,
}

/// 一个目录中的全部输入：XML 文档 + PDF 附件
#[derive(Debug, Default)]
pub struct BatchFolder {
    pub documents: Vec<XmlDocument>,
    pub attachments: AttachmentSet,
}

/// 扫描目录，按文件名排序加载所有 `.xml` 和 `.pdf` 文件（扩展名不区分大小写）
pub async fn load_batch_folder(folder_path: &str) -> Result<BatchFolder> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut batch = BatchFolder::default();

    for path in paths {
        let name = file_name(&path);
        match extension_lower(&path).as_deref() {
            Some("xml") => {
                let bytes = fs::read(&path)
                    .await
                    .with_context(|| format!("无法读取XML文件: {}", path.display()))?;
                match String::from_utf8(bytes) {
                    Ok(content) => {
                        tracing::info!("正在加载: {}", name);
                        batch.documents.push(XmlDocument { name, content });
                    }
                    Err(e) => {
                        tracing::warn!("XML 文件不是有效的 UTF-8，已跳过 {}: {}", name, e);
                    }
                }
            }
            Some("pdf") => {
                let bytes = fs::read(&path)
                    .await
                    .with_context(|| format!("无法读取PDF文件: {}", path.display()))?;
                tracing::debug!("加载附件: {} ({} 字节)", name, bytes.len());
                batch.attachments.insert(name, bytes);
            }
            _ => {
                tracing::debug!("忽略文件: {}", name);
            }
        }
    }

    tracing::info!(
        "成功加载 {} 个XML文档, {} 个PDF附件",
        batch.documents.len(),
        batch.attachments.len()
    );

    Ok(batch)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_batch_folder_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lote_b.xml"), "<lote/>").unwrap();
        std::fs::write(dir.path().join("lote_a.XML"), "<lote/>").unwrap();
        std::fs::write(dir.path().join("123_GUIA_doc1.PDF"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        std::fs::write(dir.path().join("broken.xml"), [0xff, 0xfe, 0x00]).unwrap();

        let batch = load_batch_folder(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let names: Vec<&str> = batch.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["lote_a.XML", "lote_b.xml"]);
        assert_eq!(batch.attachments.len(), 1);
        assert_eq!(
            batch.attachments.get("123_GUIA_doc1.PDF").map(|a| a.bytes.len()),
            Some(8)
        );
    }

    #[tokio::test]
    async fn test_load_batch_folder_missing_dir() {
        let err = load_batch_folder("/definitely/not/here").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FileError>(),
            Some(FileError::DirectoryNotFound { path }) if path == "/definitely/not/here"
        ));
    }
}
