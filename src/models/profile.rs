use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::consultation::{ConsultationCategory, ConsultationId, DateRange};
use crate::models::evaluation::{DimensionKey, EvaluationDimension};
use crate::models::student::Student;
use crate::models::topik::TopikTestResult;

/// 时点型维度的最新快照，记录来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSnapshot {
    pub dimension: EvaluationDimension,
    pub consultation_id: ConsultationId,
    pub date: NaiveDate,
}

/// 志愿历史中的一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub university: String,
    pub major: String,
    pub rank: u8,
    pub recorded_on: NaiveDate,
    pub consultation_id: ConsultationId,
}

/// 获奖 / 成果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub awarded_on: NaiveDate,
    pub consultation_id: ConsultationId,
}

/// 报告中引用的咨询记录（生成时复制的值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationSummary {
    pub id: ConsultationId,
    pub date: NaiveDate,
    pub category: ConsultationCategory,
    pub summary: String,
    pub counselor_evaluation: String,
}

impl ConsultationSummary {
    pub fn has_counselor_evaluation(&self) -> bool {
        !self.counselor_evaluation.trim().is_empty()
    }
}

/// 聚合后的学生档案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedProfile {
    pub student: Student,
    pub range: DateRange,
    /// 每个时点型维度的最新评价
    pub latest: BTreeMap<DimensionKey, DimensionSnapshot>,
    /// 按时间顺序
    pub topik_results: Vec<TopikTestResult>,
    pub preferences: Vec<PreferenceEntry>,
    pub achievements: Vec<Achievement>,
    /// 范围内全部咨询，按日期升序
    pub consultations: Vec<ConsultationSummary>,
}

impl AggregatedProfile {
    pub fn empty(student: Student, range: DateRange) -> Self {
        Self {
            student,
            range,
            latest: BTreeMap::new(),
            topik_results: Vec::new(),
            preferences: Vec::new(),
            achievements: Vec::new(),
            consultations: Vec::new(),
        }
    }

    /// 范围内没有任何咨询记录
    pub fn is_empty(&self) -> bool {
        self.consultations.is_empty()
    }

    pub fn snapshot(&self, key: DimensionKey) -> Option<&DimensionSnapshot> {
        self.latest.get(&key)
    }

    pub fn consultation(&self, id: ConsultationId) -> Option<&ConsultationSummary> {
        self.consultations.iter().find(|c| c.id == id)
    }

    /// 最近一条非空的咨询老师评语
    pub fn latest_counselor_evaluation(&self) -> Option<&ConsultationSummary> {
        self.consultations
            .iter()
            .rev()
            .find(|c| c.has_counselor_evaluation())
    }
}
