use crate::models::consultation::{ConsultationRecord, RawConsultation};
use crate::models::request::ReportRequest;
use crate::models::student::Student;
use crate::models::template::ReportTemplate;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 数据目录中的文件名
pub const STUDENTS_FILE: &str = "students.toml";
pub const CONSULTATIONS_FILE: &str = "consultations.toml";
pub const TEMPLATES_FILE: &str = "templates.toml";

/// 从数据目录加载的全部数据
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub students: Vec<Student>,
    pub consultations: Vec<ConsultationRecord>,
    pub templates: Vec<ReportTemplate>,
}

#[derive(Debug, Deserialize)]
struct StudentsFile {
    #[serde(default)]
    students: Vec<Student>,
}

#[derive(Debug, Deserialize)]
struct ConsultationsFile {
    #[serde(default)]
    consultations: Vec<RawConsultation>,
}

#[derive(Debug, Deserialize)]
struct TemplatesFile {
    #[serde(default)]
    templates: Vec<ReportTemplate>,
}

#[derive(Debug, Deserialize)]
struct BatchFile {
    #[serde(default)]
    requests: Vec<ReportRequest>,
}

/// 读取并解析单个 TOML 文件
async fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("无法解析TOML文件: {}", path.display()))
}

/// 从数据目录加载学生、咨询记录和模板
///
/// 咨询记录中的评价 JSON 在这里解析（入库时只解析一次）
pub async fn load_dataset(folder_path: &str) -> Result<Dataset> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let students: StudentsFile = load_toml(&folder.join(STUDENTS_FILE)).await?;
    tracing::info!("成功加载 {} 个学生", students.students.len());

    let consultations: ConsultationsFile = load_toml(&folder.join(CONSULTATIONS_FILE)).await?;
    let consultations: Vec<ConsultationRecord> = consultations
        .consultations
        .into_iter()
        .map(ConsultationRecord::from)
        .collect();
    tracing::info!("成功加载 {} 条咨询记录", consultations.len());

    let templates: TemplatesFile = load_toml(&folder.join(TEMPLATES_FILE)).await?;
    tracing::info!("成功加载 {} 个报告模板", templates.templates.len());

    Ok(Dataset {
        students: students.students,
        consultations,
        templates: templates.templates,
    })
}

/// 加载批量生成请求
pub async fn load_batch_file(path: &Path) -> Result<Vec<ReportRequest>> {
    let batch: BatchFile = load_toml(path).await?;

    if batch.requests.is_empty() {
        tracing::warn!("批量文件中没有请求: {}", path.display());
    }

    Ok(batch.requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluation::Evaluation;

    #[tokio::test]
    async fn loads_dataset_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(STUDENTS_FILE),
            r#"
            [[students]]
            id = 1
            code = "S2024001"
            "#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONSULTATIONS_FILE),
            r#"
            [[consultations]]
            id = 10
            student_id = 1
            date = "2024-03-02"
            category = "topik"
            evaluation = '{"schema":"topik.v1","test_number":1,"reading":50,"listening":45,"total":95}'

            [[consultations]]
            id = 11
            student_id = 1
            date = "2024-04-02"
            category = "academic"
            evaluation = "broken"
            "#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(TEMPLATES_FILE),
            r#"
            [[templates]]
            code = "routine"
            allowed_purposes = ["routine"]
            languages = ["en"]
            "#,
        )
        .unwrap();

        let dataset = load_dataset(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(dataset.students.len(), 1);
        assert_eq!(dataset.consultations.len(), 2);
        assert!(matches!(dataset.consultations[0].evaluation, Evaluation::TopikV1 { .. }));
        assert!(dataset.consultations[1].evaluation.is_empty());
        assert_eq!(dataset.templates[0].code, "routine");
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        assert!(load_dataset("/definitely/not/here").await.is_err());
    }
}
