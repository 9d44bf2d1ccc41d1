//! 报告编译 - 业务能力层
//!
//! 校验（档案 + 趋势 + 模板）并映射为与渲染器无关的文档。
//! 校验失败时不产生任何文档，调用方也不会登记报告。

use std::collections::HashSet;

use crate::error::{AppResult, NotFoundError, ValidationError};
use crate::models::consultation::{ConsultationId, DateRange};
use crate::models::document::{Document, Field, Section, Table};
use crate::models::evaluation::DimensionKey;
use crate::models::profile::{AggregatedProfile, ConsultationSummary, DimensionSnapshot};
use crate::models::template::{Language, ReportField, ReportPurpose, ReportTemplate};
use crate::models::topik::Subscore;
use crate::services::labels::label;
use crate::services::trend_analyzer::TrendAnalysis;

/// 一次编译的全部输入
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub profile: &'a AggregatedProfile,
    pub trend: &'a TrendAnalysis,
    pub template: &'a ReportTemplate,
    pub language: Language,
    pub purpose: ReportPurpose,
    /// 显式选择的咨询记录；正式报告必须提供
    pub selected: Option<&'a [ConsultationId]>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportCompiler;

impl ReportCompiler {
    pub fn new() -> Self {
        Self
    }

    /// 校验并编译报告文档
    ///
    /// 校验顺序：模板用途与语言 → 必填字段 → 正式报告的咨询选择。
    /// 相同输入总是得到相同的文档
    pub fn compile(&self, request: &CompileRequest<'_>) -> AppResult<Document> {
        check_template(request)?;
        check_required_fields(request)?;
        let included = select_consultations(request)?;

        Ok(DocumentBuilder::new(request.language).build(request, &included))
    }
}

fn check_template(request: &CompileRequest<'_>) -> Result<(), ValidationError> {
    let template = request.template;
    if !template.allows_purpose(request.purpose) {
        return Err(ValidationError::UnsupportedPurpose {
            template: template.code.clone(),
            purpose: request.purpose,
        });
    }
    if !template.supports_language(request.language) {
        return Err(ValidationError::UnsupportedLanguage {
            template: template.code.clone(),
            language: request.language,
        });
    }
    Ok(())
}

/// 收集全部缺失字段后一次性报告
fn check_required_fields(request: &CompileRequest<'_>) -> Result<(), ValidationError> {
    let missing: Vec<ReportField> = request
        .template
        .required_fields
        .iter()
        .copied()
        .filter(|field| !is_present(*field, request.profile, request.trend))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields { fields: missing })
    }
}

fn is_present(field: ReportField, profile: &AggregatedProfile, trend: &TrendAnalysis) -> bool {
    match field {
        ReportField::StudentCode => !profile.student.code.trim().is_empty(),
        ReportField::AcademicEvaluation => profile.snapshot(DimensionKey::Academic).is_some(),
        ReportField::AttitudeEvaluation => profile.snapshot(DimensionKey::Attitude).is_some(),
        ReportField::AttendanceEvaluation => profile.snapshot(DimensionKey::Attendance).is_some(),
        ReportField::AdaptationEvaluation => profile.snapshot(DimensionKey::Adaptation).is_some(),
        ReportField::CareerReadiness => profile.snapshot(DimensionKey::CareerReadiness).is_some(),
        ReportField::TopikHistory => !profile.topik_results.is_empty(),
        ReportField::TopikTrend => trend.has_trend(),
        ReportField::TopikPrediction => trend.next_score.is_some(),
        ReportField::PreferenceHistory => !profile.preferences.is_empty(),
        ReportField::Achievements => !profile.achievements.is_empty(),
        ReportField::Consultations => !profile.consultations.is_empty(),
        ReportField::CounselorEvaluation => profile.latest_counselor_evaluation().is_some(),
    }
}

/// 确定报告引用的咨询记录
///
/// 正式报告：必须显式选择，且每条都要有咨询老师评语
fn select_consultations<'a>(
    request: &CompileRequest<'a>,
) -> AppResult<Vec<&'a ConsultationSummary>> {
    let profile = request.profile;
    let official = request.purpose.is_official();

    let selected = match request.selected {
        Some(ids) if !ids.is_empty() => ids,
        _ if official => {
            return Err(ValidationError::SelectionRequired {
                purpose: request.purpose,
            }
            .into())
        }
        _ => return Ok(profile.consultations.iter().collect()),
    };

    let wanted: HashSet<ConsultationId> = selected.iter().copied().collect();
    let unknown: Vec<ConsultationId> = dedup(selected)
        .into_iter()
        .filter(|id| profile.consultation(*id).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(NotFoundError::Consultations(unknown).into());
    }

    // 按档案中的时间顺序输出
    let included: Vec<&ConsultationSummary> = profile
        .consultations
        .iter()
        .filter(|c| wanted.contains(&c.id))
        .collect();

    if official {
        let offending: Vec<ConsultationId> = included
            .iter()
            .filter(|c| !c.has_counselor_evaluation())
            .map(|c| c.id)
            .collect();
        if !offending.is_empty() {
            return Err(ValidationError::MissingCounselorEvaluation {
                consultation_ids: offending,
            }
            .into());
        }
    }

    Ok(included)
}

fn dedup(ids: &[ConsultationId]) -> Vec<ConsultationId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

struct DocumentBuilder {
    language: Language,
}

impl DocumentBuilder {
    fn new(language: Language) -> Self {
        Self { language }
    }

    fn t(&self, key: &str) -> String {
        label(self.language, key)
    }

    fn none(&self) -> String {
        self.t("value.none")
    }

    fn field(&self, key: &str, value: impl Into<String>) -> Field {
        Field {
            key: key.to_string(),
            label: self.t(key),
            value: value.into(),
        }
    }

    fn optional(&self, key: &str, value: Option<String>) -> Field {
        let value = value.unwrap_or_else(|| self.none());
        self.field(key, value)
    }

    fn section(&self, key: &str) -> Section {
        Section::new(key, self.t(key))
    }

    fn table(&self, key: &str, columns: &[&str], rows: Vec<Vec<String>>) -> Table {
        Table {
            key: key.to_string(),
            title: self.t(key),
            columns: columns.iter().map(|c| self.t(c)).collect(),
            rows,
        }
    }

    fn build(&self, request: &CompileRequest<'_>, included: &[&ConsultationSummary]) -> Document {
        Document {
            template_code: request.template.code.clone(),
            language: request.language,
            purpose: request.purpose,
            title: self.t("title.report"),
            sections: vec![
                self.student_section(request),
                self.evaluation_section(request.profile, included),
                self.topik_section(request.profile, request.trend),
                self.preference_section(request.profile),
                self.achievement_section(request.profile),
                self.consultation_section(included),
            ],
        }
    }

    fn student_section(&self, request: &CompileRequest<'_>) -> Section {
        let student = &request.profile.student;
        let mut section = self.section("section.student");
        section.fields = vec![
            self.field("field.student_code", student.code.clone()),
            self.field("field.student_name", student.display_name()),
            self.field("field.purpose", self.t(request.purpose.key())),
            self.field("field.period", self.period(&request.profile.range)),
        ];
        section
    }

    fn period(&self, range: &DateRange) -> String {
        match (range.from, range.to) {
            (None, None) => self.t("value.all_periods"),
            (from, to) => format!(
                "{} ~ {}",
                from.map(|d| d.to_string()).unwrap_or_default(),
                to.map(|d| d.to_string()).unwrap_or_default()
            )
            .trim()
            .to_string(),
        }
    }

    fn snapshot_value(&self, snapshot: &DimensionSnapshot) -> String {
        let rating = self.t(snapshot.dimension.rating.key());
        let notes = snapshot.dimension.notes.trim();
        if notes.is_empty() {
            rating
        } else {
            format!("{} ({})", rating, notes)
        }
    }

    fn evaluation_section(
        &self,
        profile: &AggregatedProfile,
        included: &[&ConsultationSummary],
    ) -> Section {
        let mut section = self.section("section.evaluations");
        for key in DimensionKey::ALL {
            let value = profile.snapshot(key).map(|s| self.snapshot_value(s));
            section.fields.push(self.optional(key.key(), value));
        }

        let counselor = included
            .iter()
            .rev()
            .find(|c| c.has_counselor_evaluation())
            .map(|c| c.counselor_evaluation.trim().to_string());
        section
            .fields
            .push(self.optional("field.counselor_evaluation", counselor));
        section
    }

    fn topik_section(&self, profile: &AggregatedProfile, trend: &TrendAnalysis) -> Section {
        let mut section = self.section("section.topik");
        let subscore_list = |list: &[Subscore]| -> Option<String> {
            if list.is_empty() {
                None
            } else {
                Some(
                    list.iter()
                        .map(|s| self.t(s.key()))
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            }
        };

        let balanced = trend.subscores.mean.is_some() && trend.subscores.is_balanced();
        let strengths = if balanced {
            Some(self.t("value.balanced"))
        } else {
            subscore_list(&trend.subscores.strengths)
        };

        section.fields = vec![
            self.field("topik.attempts", trend.data_points.to_string()),
            self.optional("topik.latest_total", trend.latest_total.map(|v| v.to_string())),
            self.optional("topik.best_total", trend.best_total.map(|v| v.to_string())),
            self.optional("topik.average_total", trend.average_total.map(|v| format!("{:.1}", v))),
            self.optional(
                "topik.slope",
                trend.has_trend().then(|| format!("{:+.1}", trend.slope)),
            ),
            self.field("topik.pattern", self.t(trend.pattern.key())),
            self.field("topik.confidence", self.t(trend.confidence.key())),
            self.optional("topik.next_score", trend.next_score.map(|v| format!("{:.1}", v))),
            self.optional("topik.predicted_level", trend.predicted_level.map(|v| v.to_string())),
            self.field("topik.target_score", trend.target_score.to_string()),
            self.optional("topik.tests_to_target", trend.tests_to_target.map(|v| v.to_string())),
            self.optional("topik.strengths", strengths),
            self.optional("topik.weaknesses", subscore_list(&trend.subscores.weaknesses)),
        ];

        let rows = profile
            .topik_results
            .iter()
            .map(|r| {
                vec![
                    r.test_number.to_string(),
                    r.taken_on.to_string(),
                    r.reading.to_string(),
                    r.listening.to_string(),
                    r.writing.map(|w| w.to_string()).unwrap_or_else(|| self.none()),
                    r.total.to_string(),
                    r.effective_level()
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| self.none()),
                ]
            })
            .collect();
        section.tables.push(self.table(
            "topik.history",
            &[
                "topik.test_number",
                "field.date",
                "topik.reading",
                "topik.listening",
                "topik.writing",
                "topik.total",
                "topik.level",
            ],
            rows,
        ));
        section
    }

    fn preference_section(&self, profile: &AggregatedProfile) -> Section {
        let mut section = self.section("section.preferences");
        let rows = profile
            .preferences
            .iter()
            .map(|p| {
                vec![
                    p.recorded_on.to_string(),
                    p.rank.to_string(),
                    p.university.clone(),
                    if p.major.is_empty() { self.none() } else { p.major.clone() },
                ]
            })
            .collect();
        section.tables.push(self.table(
            "section.preferences",
            &["field.date", "field.rank", "field.university", "field.major"],
            rows,
        ));
        section
    }

    fn achievement_section(&self, profile: &AggregatedProfile) -> Section {
        let mut section = self.section("section.achievements");
        let rows = profile
            .achievements
            .iter()
            .map(|a| {
                vec![
                    a.awarded_on.to_string(),
                    a.title.clone(),
                    a.description.clone(),
                ]
            })
            .collect();
        section.tables.push(self.table(
            "section.achievements",
            &["field.date", "field.title", "field.description"],
            rows,
        ));
        section
    }

    fn consultation_section(&self, included: &[&ConsultationSummary]) -> Section {
        let mut section = self.section("section.consultations");
        let rows = included
            .iter()
            .map(|c| {
                vec![
                    c.date.to_string(),
                    self.t(c.category.key()),
                    c.summary.clone(),
                    c.counselor_evaluation.trim().to_string(),
                ]
            })
            .collect();
        section.tables.push(self.table(
            "section.consultations",
            &[
                "field.date",
                "field.category",
                "field.summary",
                "field.counselor_evaluation",
            ],
            rows,
        ));
        section
    }
}
