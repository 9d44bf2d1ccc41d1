//! TOPIK 成绩趋势分析 - 业务能力层
//!
//! 纯函数：相同输入总是得到相同输出。数据不足时返回低置信度结果，
//! 只有输入本身不合法（重复的模考次数、分数越界）时才返回错误。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::TrendConfig;
use crate::error::{AppResult, ValidationError};
use crate::models::topik::{level_for_total, ScoreBounds, Subscore, TopikTestResult, MAX_TEST_NUMBER};

/// 成绩走势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPattern {
    RapidImprovement,
    SteadyImprovement,
    GradualImprovement,
    Stable,
    NeedsSupport,
    /// 少于 2 次成绩，无法判断
    InsufficientData,
}

impl TrendPattern {
    pub fn is_improvement(self) -> bool {
        matches!(
            self,
            TrendPattern::RapidImprovement
                | TrendPattern::SteadyImprovement
                | TrendPattern::GradualImprovement
        )
    }

    pub fn key(self) -> &'static str {
        match self {
            TrendPattern::RapidImprovement => "pattern.rapid_improvement",
            TrendPattern::SteadyImprovement => "pattern.steady_improvement",
            TrendPattern::GradualImprovement => "pattern.gradual_improvement",
            TrendPattern::Stable => "pattern.stable",
            TrendPattern::NeedsSupport => "pattern.needs_support",
            TrendPattern::InsufficientData => "pattern.insufficient_data",
        }
    }
}

/// 预测置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn key(self) -> &'static str {
        match self {
            Confidence::High => "confidence.high",
            Confidence::Medium => "confidence.medium",
            Confidence::Low => "confidence.low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscoreAverage {
    pub subscore: Subscore,
    pub average: f64,
}

/// 单项强弱分析
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscoreProfile {
    /// 只包含有数据的单项，按 阅读 / 听力 / 写作 顺序
    pub averages: Vec<SubscoreAverage>,
    /// 各单项平均分的均值
    pub mean: Option<f64>,
    pub strengths: Vec<Subscore>,
    pub weaknesses: Vec<Subscore>,
}

impl SubscoreProfile {
    /// 没有偏离均值超过阈值的单项
    pub fn is_balanced(&self) -> bool {
        self.strengths.is_empty() && self.weaknesses.is_empty()
    }

    pub fn average(&self, subscore: Subscore) -> Option<f64> {
        self.averages
            .iter()
            .find(|a| a.subscore == subscore)
            .map(|a| a.average)
    }
}

/// 趋势分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub data_points: usize,
    /// 总分对模考次数的最小二乘斜率
    pub slope: f64,
    pub pattern: TrendPattern,
    pub confidence: Confidence,
    pub latest_total: Option<u32>,
    pub best_total: Option<u32>,
    pub average_total: Option<f64>,
    /// 下一次的预测总分，限制在 [0, 满分]
    pub next_score: Option<f64>,
    pub predicted_level: Option<u8>,
    pub target_score: u32,
    /// 预计还需几次模考达到目标，斜率不为正时为空
    pub tests_to_target: Option<u32>,
    pub subscores: SubscoreProfile,
}

impl TrendAnalysis {
    pub fn has_trend(&self) -> bool {
        self.data_points >= 2
    }
}

pub struct TopikTrendAnalyzer {
    config: TrendConfig,
}

impl TopikTrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// 分析 TOPIK 模考趋势
    ///
    /// # 参数
    /// * `results` - 模考成绩，顺序不限，按模考次数排序后计算
    /// * `bounds` - 单项分和总分上限
    ///
    /// # 返回
    /// 趋势分析结果；次数重复、越界或分数超限时返回校验错误
    pub fn analyze(
        &self,
        results: &[TopikTestResult],
        bounds: ScoreBounds,
    ) -> AppResult<TrendAnalysis> {
        validate(results, bounds)?;

        let mut ordered: Vec<&TopikTestResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.test_number);

        let data_points = ordered.len();
        let slope = least_squares_slope(&ordered);
        let latest_total = ordered.last().map(|r| r.total);

        let next_score = latest_total.map(|latest| {
            if data_points < 2 {
                latest as f64
            } else {
                (latest as f64 + slope).clamp(0.0, bounds.max_total as f64)
            }
        });

        let target_score = self.config.target_score;
        let tests_to_target = match latest_total {
            Some(latest) if latest >= target_score => Some(0),
            Some(latest) if data_points >= 2 && slope > 0.0 => {
                Some(((target_score - latest) as f64 / slope).ceil() as u32)
            }
            _ => None,
        };

        let totals: Vec<u32> = ordered.iter().map(|r| r.total).collect();

        Ok(TrendAnalysis {
            data_points,
            slope,
            pattern: self.classify(data_points, slope),
            confidence: confidence(&totals),
            latest_total,
            best_total: totals.iter().copied().max(),
            average_total: mean(totals.iter().map(|&t| t as f64)),
            next_score,
            predicted_level: next_score.and_then(level_for_total),
            target_score,
            tests_to_target,
            subscores: self.subscore_profile(&ordered),
        })
    }

    fn classify(&self, data_points: usize, slope: f64) -> TrendPattern {
        let cfg = &self.config;
        if data_points < 2 {
            TrendPattern::InsufficientData
        } else if slope > cfg.rapid_slope {
            TrendPattern::RapidImprovement
        } else if slope > cfg.steady_slope {
            TrendPattern::SteadyImprovement
        } else if slope > cfg.stable_epsilon {
            TrendPattern::GradualImprovement
        } else if slope >= -cfg.stable_epsilon {
            TrendPattern::Stable
        } else {
            TrendPattern::NeedsSupport
        }
    }

    fn subscore_profile(&self, ordered: &[&TopikTestResult]) -> SubscoreProfile {
        let averages: Vec<SubscoreAverage> = Subscore::ALL
            .iter()
            .filter_map(|&subscore| {
                mean(
                    ordered
                        .iter()
                        .filter_map(|r| r.subscore(subscore))
                        .map(|v| v as f64),
                )
                .map(|average| SubscoreAverage { subscore, average })
            })
            .collect();

        let Some(overall) = mean(averages.iter().map(|a| a.average)) else {
            return SubscoreProfile::default();
        };

        let margin = self.config.strength_margin;
        let strengths = averages
            .iter()
            .filter(|a| a.average >= overall + margin)
            .map(|a| a.subscore)
            .collect();
        let weaknesses = averages
            .iter()
            .filter(|a| a.average <= overall - margin)
            .map(|a| a.subscore)
            .collect();

        SubscoreProfile {
            averages,
            mean: Some(overall),
            strengths,
            weaknesses,
        }
    }
}

fn validate(results: &[TopikTestResult], bounds: ScoreBounds) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for result in results {
        if result.test_number == 0 || result.test_number > MAX_TEST_NUMBER {
            return Err(ValidationError::TestNumberOutOfRange {
                test_number: result.test_number,
                max: MAX_TEST_NUMBER,
            });
        }
        if !seen.insert(result.test_number) {
            return Err(ValidationError::DuplicateTestNumber {
                test_number: result.test_number,
            });
        }
        for subscore in Subscore::ALL {
            if let Some(value) = result.subscore(subscore) {
                if value > bounds.max_subscore {
                    return Err(ValidationError::SubscoreOutOfBounds {
                        test_number: result.test_number,
                        subscore,
                        value,
                        max: bounds.max_subscore,
                    });
                }
            }
        }
        if result.total > bounds.max_total {
            return Err(ValidationError::TotalOutOfBounds {
                test_number: result.test_number,
                value: result.total,
                max: bounds.max_total,
            });
        }
    }
    Ok(())
}

/// 少于 2 个点时斜率为 0
fn least_squares_slope(ordered: &[&TopikTestResult]) -> f64 {
    if ordered.len() < 2 {
        return 0.0;
    }
    let n = ordered.len() as f64;
    let mean_x = ordered.iter().map(|r| r.test_number as f64).sum::<f64>() / n;
    let mean_y = ordered.iter().map(|r| r.total as f64).sum::<f64>() / n;

    let (num, den) = ordered.iter().fold((0.0, 0.0), |(num, den), r| {
        let dx = r.test_number as f64 - mean_x;
        let dy = r.total as f64 - mean_y;
        (num + dx * dy, den + dx * dx)
    });

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// ≥4 个点且最近 3 次变化方向一致为高；2～3 个点（或方向不一致）为中；否则为低
fn confidence(totals: &[u32]) -> Confidence {
    match totals.len() {
        0 | 1 => Confidence::Low,
        2 | 3 => Confidence::Medium,
        n => {
            let signs: Vec<std::cmp::Ordering> = totals[n - 4..]
                .windows(2)
                .map(|w| w[1].cmp(&w[0]))
                .collect();
            if signs.windows(2).all(|w| w[0] == w[1]) {
                Confidence::High
            } else {
                Confidence::Medium
            }
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::consultation::ConsultationId;
    use chrono::NaiveDate;

    fn result(test_number: u8, reading: u32, listening: u32, writing: Option<u32>) -> TopikTestResult {
        let total = reading + listening + writing.unwrap_or(0);
        TopikTestResult {
            test_number,
            reading,
            listening,
            writing,
            total,
            level: None,
            taken_on: NaiveDate::from_ymd_opt(2024, 1, test_number as u32).unwrap(),
            consultation_id: ConsultationId(test_number as i64),
        }
    }

    fn with_totals(totals: &[u32]) -> Vec<TopikTestResult> {
        totals
            .iter()
            .enumerate()
            .map(|(i, &total)| {
                let mut r = result(i as u8 + 1, total / 3, total / 3, Some(total - 2 * (total / 3)));
                r.total = total;
                r
            })
            .collect()
    }

    fn analyzer() -> TopikTrendAnalyzer {
        TopikTrendAnalyzer::new(TrendConfig::default())
    }

    #[test]
    fn no_data_is_low_confidence() {
        let analysis = analyzer().analyze(&[], ScoreBounds::default()).unwrap();
        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.pattern, TrendPattern::InsufficientData);
        assert_eq!(analysis.next_score, None);
        assert_eq!(analysis.tests_to_target, None);
        assert!(analysis.subscores.averages.is_empty());
    }

    #[test]
    fn single_point_does_not_extrapolate() {
        let analysis = analyzer()
            .analyze(&with_totals(&[110]), ScoreBounds::default())
            .unwrap();
        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.slope, 0.0);
        assert_eq!(analysis.next_score, Some(110.0));
        assert_eq!(analysis.latest_total, Some(110));
    }

    #[test]
    fn linear_improvement_is_rapid_and_predicted() {
        let analysis = analyzer()
            .analyze(&with_totals(&[40, 60, 80, 100, 120]), ScoreBounds::default())
            .unwrap();
        assert!((analysis.slope - 20.0).abs() < 1e-9);
        assert!(analysis.pattern.is_improvement());
        assert_eq!(analysis.pattern, TrendPattern::RapidImprovement);
        assert_eq!(analysis.next_score, Some(140.0));
        assert_eq!(analysis.confidence, Confidence::High);
        assert_eq!(analysis.tests_to_target, Some(2));
        assert_eq!(analysis.predicted_level, Some(3));
    }

    #[test]
    fn prediction_is_clamped_to_max_total() {
        let analysis = analyzer()
            .analyze(&with_totals(&[200, 250, 290]), ScoreBounds::default())
            .unwrap();
        assert_eq!(analysis.next_score, Some(300.0));
        assert_eq!(analysis.confidence, Confidence::Medium);
        assert_eq!(analysis.tests_to_target, Some(0));
    }

    #[test]
    fn classification_thresholds() {
        let a = analyzer();
        assert_eq!(a.classify(3, 10.5), TrendPattern::RapidImprovement);
        assert_eq!(a.classify(3, 10.0), TrendPattern::SteadyImprovement);
        assert_eq!(a.classify(3, 5.0), TrendPattern::GradualImprovement);
        assert_eq!(a.classify(3, 0.4), TrendPattern::Stable);
        assert_eq!(a.classify(3, -0.5), TrendPattern::Stable);
        assert_eq!(a.classify(3, -3.0), TrendPattern::NeedsSupport);
    }

    #[test]
    fn declining_scores_need_support_without_eta() {
        let analysis = analyzer()
            .analyze(&with_totals(&[140, 120, 100]), ScoreBounds::default())
            .unwrap();
        assert_eq!(analysis.pattern, TrendPattern::NeedsSupport);
        assert_eq!(analysis.tests_to_target, None);
    }

    #[test]
    fn unstable_direction_lowers_confidence() {
        let analysis = analyzer()
            .analyze(&with_totals(&[100, 110, 105, 120]), ScoreBounds::default())
            .unwrap();
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn strengths_and_weaknesses() {
        let results = vec![result(1, 80, 60, Some(40)), result(2, 84, 62, Some(44))];
        let analysis = analyzer().analyze(&results, ScoreBounds::default()).unwrap();

        assert_eq!(analysis.subscores.strengths, vec![Subscore::Reading]);
        assert_eq!(analysis.subscores.weaknesses, vec![Subscore::Writing]);
        assert!(!analysis.subscores.is_balanced());
        assert_eq!(analysis.subscores.average(Subscore::Listening), Some(61.0));
    }

    #[test]
    fn balanced_when_within_margin() {
        let results = vec![result(1, 60, 62, Some(58)), result(2, 61, 60, None)];
        let analysis = analyzer().analyze(&results, ScoreBounds::default()).unwrap();
        assert!(analysis.subscores.is_balanced());
        assert_eq!(analysis.subscores.average(Subscore::Writing), Some(58.0));
    }

    #[test]
    fn duplicate_test_number_is_rejected() {
        let results = vec![result(1, 50, 50, None), result(1, 55, 50, None)];
        let err = analyzer()
            .analyze(&results, ScoreBounds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::DuplicateTestNumber { test_number: 1 })
        ));
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        let err = analyzer()
            .analyze(&[result(9, 50, 50, None)], ScoreBounds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::TestNumberOutOfRange { .. })
        ));

        let err = analyzer()
            .analyze(&[result(1, 101, 50, None)], ScoreBounds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::SubscoreOutOfBounds { .. })
        ));
    }

    #[test]
    fn analysis_is_deterministic() {
        let input = with_totals(&[95, 101, 99, 130, 128]);
        let a = analyzer().analyze(&input, ScoreBounds::default()).unwrap();
        let b = analyzer().analyze(&input, ScoreBounds::default()).unwrap();
        assert_eq!(a, b);
    }
}
