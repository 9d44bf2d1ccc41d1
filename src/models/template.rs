use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::topik::ScoreBounds;

/// 报告语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
    Vi,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Vi => "vi",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 报告用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPurpose {
    /// 日常报告
    Routine,
    /// 签证提交
    Visa,
    /// 大学申请
    University,
}

impl ReportPurpose {
    /// 对外提交的正式报告（签证 / 升学）
    pub fn is_official(self) -> bool {
        match self {
            ReportPurpose::Routine => false,
            ReportPurpose::Visa | ReportPurpose::University => true,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ReportPurpose::Routine => "purpose.routine",
            ReportPurpose::Visa => "purpose.visa",
            ReportPurpose::University => "purpose.university",
        }
    }
}

impl fmt::Display for ReportPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportPurpose::Routine => "routine",
            ReportPurpose::Visa => "visa",
            ReportPurpose::University => "university",
        };
        f.write_str(name)
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Pdf,
    Html,
}

impl RenderFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RenderFormat::Pdf => "pdf",
            RenderFormat::Html => "html",
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 模板可以要求的字段
///
/// 模板文件中使用 snake_case 名称，未知名称在加载模板时即报错
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportField {
    StudentCode,
    AcademicEvaluation,
    AttitudeEvaluation,
    AttendanceEvaluation,
    AdaptationEvaluation,
    CareerReadiness,
    TopikHistory,
    TopikTrend,
    TopikPrediction,
    PreferenceHistory,
    Achievements,
    Consultations,
    CounselorEvaluation,
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportField::StudentCode => "student_code",
            ReportField::AcademicEvaluation => "academic_evaluation",
            ReportField::AttitudeEvaluation => "attitude_evaluation",
            ReportField::AttendanceEvaluation => "attendance_evaluation",
            ReportField::AdaptationEvaluation => "adaptation_evaluation",
            ReportField::CareerReadiness => "career_readiness",
            ReportField::TopikHistory => "topik_history",
            ReportField::TopikTrend => "topik_trend",
            ReportField::TopikPrediction => "topik_prediction",
            ReportField::PreferenceHistory => "preference_history",
            ReportField::Achievements => "achievements",
            ReportField::Consultations => "consultations",
            ReportField::CounselorEvaluation => "counselor_evaluation",
        };
        f.write_str(name)
    }
}

/// 报告模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required_fields: BTreeSet<ReportField>,
    pub allowed_purposes: BTreeSet<ReportPurpose>,
    pub languages: BTreeSet<Language>,
    #[serde(default)]
    pub score_bounds: ScoreBounds,
}

impl ReportTemplate {
    pub fn allows_purpose(&self, purpose: ReportPurpose) -> bool {
        self.allowed_purposes.contains(&purpose)
    }

    pub fn supports_language(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_rejects_unknown_required_field() {
        let ok = r#"
            code = "visa-basic"
            required_fields = ["student_code", "topik_history"]
            allowed_purposes = ["visa"]
            languages = ["ko", "vi"]
        "#;
        let template: ReportTemplate = toml::from_str(ok).unwrap();
        assert_eq!(template.required_fields.len(), 2);
        assert_eq!(template.score_bounds, ScoreBounds::default());
        assert!(template.allows_purpose(ReportPurpose::Visa));
        assert!(!template.supports_language(Language::En));

        let bad = r#"
            code = "broken"
            required_fields = ["favourite_colour"]
            allowed_purposes = ["routine"]
            languages = ["en"]
        "#;
        assert!(toml::from_str::<ReportTemplate>(bad).is_err());
    }

    #[test]
    fn official_purposes() {
        assert!(!ReportPurpose::Routine.is_official());
        assert!(ReportPurpose::Visa.is_official());
        assert!(ReportPurpose::University.is_official());
    }
}
