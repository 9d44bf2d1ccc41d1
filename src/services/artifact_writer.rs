//! 报告文件写入服务 - 业务能力层
//!
//! 只负责把渲染结果写入输出目录，不关心流程

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::report::ReportId;
use crate::models::template::Language;

/// 写入完成的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: String,
    pub size: u64,
}

/// 报告文件写入服务
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 生成文件名：学号_模板_语言_报告ID.扩展名
    pub fn file_name(
        student_code: &str,
        template_code: &str,
        language: Language,
        report_id: ReportId,
        extension: &str,
    ) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            sanitize(student_code),
            sanitize(template_code),
            language.code(),
            report_id,
            extension
        )
    }

    /// 写入渲染结果
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> AppResult<WrittenArtifact> {
        let path = self.output_dir.join(file_name);
        let path_str = path.to_string_lossy().to_string();

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::write_failed(self.output_dir.to_string_lossy(), e))?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::write_failed(path_str.clone(), e))?;

        debug!("写入报告文件: {} ({} 字节)", path_str, bytes.len());

        Ok(WrittenArtifact {
            path: path_str,
            size: bytes.len() as u64,
        })
    }
}

/// 文件名中只保留字母、数字、下划线和连字符
fn sanitize(raw: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"));
    let cleaned = re.replace_all(raw.trim(), "-");
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        let name = ArtifactWriter::file_name(
            "S 2024/001",
            "visa.basic",
            Language::Vi,
            ReportId(7),
            "pdf",
        );
        assert_eq!(name, "S-2024-001_visa-basic_vi_7.pdf");
        assert_eq!(sanitize("   "), "unnamed");
    }

    #[tokio::test]
    async fn writes_bytes_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("nested"));

        let artifact = writer.write("a.pdf", b"hello").await.unwrap();
        assert_eq!(artifact.size, 5);
        assert_eq!(std::fs::read(&artifact.path).unwrap(), b"hello");
    }
}
