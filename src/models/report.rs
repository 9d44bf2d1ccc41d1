use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::student::StudentId;
use crate::models::template::{Language, ReportPurpose};

/// 报告 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 报告状态
///
/// 只允许 generating → completed | failed，completed → archived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
    Archived,
}

impl ReportStatus {
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (ReportStatus::Generating, ReportStatus::Completed)
                | (ReportStatus::Generating, ReportStatus::Failed)
                | (ReportStatus::Completed, ReportStatus::Archived)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportStatus::Generating => "generating",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
            ReportStatus::Archived => "archived",
        };
        f.write_str(name)
    }
}

/// 新建报告记录所需的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub student_id: StudentId,
    pub template_code: String,
    pub language: Language,
    pub purpose: ReportPurpose,
}

/// 状态更新时附带的信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUpdate {
    pub pdf_path: Option<String>,
    pub file_size: Option<u64>,
    pub generation_time_ms: Option<u64>,
    pub error_message: Option<String>,
}

impl ReportUpdate {
    pub fn completed(pdf_path: String, file_size: u64, generation_time_ms: u64) -> Self {
        Self {
            pdf_path: Some(pdf_path),
            file_size: Some(file_size),
            generation_time_ms: Some(generation_time_ms),
            error_message: None,
        }
    }

    pub fn failed(error_message: impl Into<String>, generation_time_ms: u64) -> Self {
        Self {
            generation_time_ms: Some(generation_time_ms),
            error_message: Some(error_message.into()),
            ..Default::default()
        }
    }
}

/// 已生成报告的元数据（报告登记表中的一行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub id: ReportId,
    pub student_id: StudentId,
    pub template_code: String,
    pub language: Language,
    pub purpose: ReportPurpose,
    pub status: ReportStatus,
    pub pdf_path: Option<String>,
    pub file_size: Option<u64>,
    pub generation_time_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// 生成完成时间，只在 completed 时写入
    pub generated_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl GeneratedReport {
    pub fn new(id: ReportId, meta: NewReport, now: DateTime<Utc>) -> Self {
        Self {
            id,
            student_id: meta.student_id,
            template_code: meta.template_code,
            language: meta.language,
            purpose: meta.purpose,
            status: ReportStatus::Generating,
            pdf_path: None,
            file_size: None,
            generation_time_ms: None,
            created_at: now,
            generated_at: None,
            error_message: None,
        }
    }

    /// 合并状态更新中的非空字段
    pub fn apply(&mut self, status: ReportStatus, update: ReportUpdate, now: DateTime<Utc>) {
        self.status = status;
        if update.pdf_path.is_some() {
            self.pdf_path = update.pdf_path;
        }
        if update.file_size.is_some() {
            self.file_size = update.file_size;
        }
        if update.generation_time_ms.is_some() {
            self.generation_time_ms = update.generation_time_ms;
        }
        if update.error_message.is_some() {
            self.error_message = update.error_message;
        }
        if status == ReportStatus::Completed {
            self.generated_at = Some(now);
        }
    }
}
