use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::consultation::ConsultationId;

/// TOPIK 模考次数上限（第 1～8 次）
pub const MAX_TEST_NUMBER: u8 = 8;

/// TOPIK 单项分数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscore {
    Reading,
    Listening,
    Writing,
}

impl Subscore {
    pub const ALL: [Subscore; 3] = [Subscore::Reading, Subscore::Listening, Subscore::Writing];

    pub fn key(self) -> &'static str {
        match self {
            Subscore::Reading => "topik.reading",
            Subscore::Listening => "topik.listening",
            Subscore::Writing => "topik.writing",
        }
    }
}

impl fmt::Display for Subscore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subscore::Reading => "reading",
            Subscore::Listening => "listening",
            Subscore::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// 分数上下限（由报告模板定义）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub max_subscore: u32,
    pub max_total: u32,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            max_subscore: 100,
            max_total: 300,
        }
    }
}

/// 一次 TOPIK 模考成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopikTestResult {
    /// 第几次模考（1～8，每个学生唯一）
    pub test_number: u8,
    pub reading: u32,
    pub listening: u32,
    /// TOPIK I 没有写作
    pub writing: Option<u32>,
    pub total: u32,
    /// 取得的等级（1～6 级）
    pub level: Option<u8>,
    pub taken_on: NaiveDate,
    pub consultation_id: ConsultationId,
}

impl TopikTestResult {
    pub fn subscore(&self, subscore: Subscore) -> Option<u32> {
        match subscore {
            Subscore::Reading => Some(self.reading),
            Subscore::Listening => Some(self.listening),
            Subscore::Writing => self.writing,
        }
    }

    /// 记录中的等级，没有记录时按总分推算
    pub fn effective_level(&self) -> Option<u8> {
        self.level.or_else(|| level_for_total(self.total as f64))
    }
}

/// 按 TOPIK II 总分划分等级（3～6 级）
///
/// 120 分以下不授予 TOPIK II 等级
pub fn level_for_total(total: f64) -> Option<u8> {
    match total {
        t if t >= 230.0 => Some(6),
        t if t >= 190.0 => Some(5),
        t if t >= 150.0 => Some(4),
        t if t >= 120.0 => Some(3),
        _ => None,
    }
}
