use serde::{Deserialize, Serialize};

use crate::models::consultation::{ConsultationId, DateRange};
use crate::models::student::StudentId;
use crate::models::template::{Language, RenderFormat, ReportPurpose};

/// 一份报告的生成请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub student_id: StudentId,
    pub template_code: String,
    pub language: Language,
    #[serde(default = "default_purpose")]
    pub purpose: ReportPurpose,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub format: RenderFormat,
    /// 显式选择的咨询记录，正式报告必须提供
    #[serde(default)]
    pub consultation_ids: Option<Vec<ConsultationId>>,
}

fn default_purpose() -> ReportPurpose {
    ReportPurpose::Routine
}

impl ReportRequest {
    pub fn routine(student_id: StudentId, template_code: impl Into<String>, language: Language) -> Self {
        Self {
            student_id,
            template_code: template_code.into(),
            language,
            purpose: ReportPurpose::Routine,
            date_range: DateRange::all(),
            format: RenderFormat::Pdf,
            consultation_ids: None,
        }
    }

    pub fn with_purpose(mut self, purpose: ReportPurpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn with_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    pub fn with_consultations(mut self, ids: Vec<ConsultationId>) -> Self {
        self.consultation_ids = Some(ids);
        self
    }
}
