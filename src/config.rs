use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// 趋势分析阈值
///
/// 斜率单位为"每次模考的总分变化"
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendConfig {
    /// 斜率大于该值为快速提升
    pub rapid_slope: f64,
    /// 斜率大于该值为稳步提升
    pub steady_slope: f64,
    /// |斜率| 不超过该值视为平稳
    pub stable_epsilon: f64,
    /// 单项平均分偏离均值超过该值视为强项 / 弱项
    pub strength_margin: f64,
    /// 预测达标所用的目标总分
    pub target_score: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            rapid_slope: 10.0,
            steady_slope: 5.0,
            stable_epsilon: 0.5,
            strength_margin: 5.0,
            target_score: 150,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 数据目录（students.toml / consultations.toml / templates.toml）
    pub data_folder: String,
    /// 批量请求文件
    pub batch_file: String,
    /// 报告输出目录
    pub output_folder: String,
    /// 每个学生处理完后的固定间隔
    pub inter_item_delay: Duration,
    /// 单个报告生成的超时时间
    pub item_timeout: Duration,
    /// 学生信息缓存的有效期
    pub student_cache_ttl: Duration,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub trend: TrendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_folder: "data".to_string(),
            batch_file: "data/batch.toml".to_string(),
            output_folder: "output_reports".to_string(),
            inter_item_delay: Duration::from_millis(1000),
            item_timeout: Duration::from_secs(120),
            student_cache_ttl: Duration::from_secs(300),
            verbose_logging: false,
            trend: TrendConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_folder: std::env::var("DATA_FOLDER").unwrap_or(default.data_folder),
            batch_file: std::env::var("BATCH_FILE").unwrap_or(default.batch_file),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            inter_item_delay: Duration::from_millis(env_or(
                "INTER_ITEM_DELAY_MS",
                default.inter_item_delay.as_millis() as u64,
            )),
            item_timeout: Duration::from_secs(env_or(
                "ITEM_TIMEOUT_SECS",
                default.item_timeout.as_secs(),
            )),
            student_cache_ttl: Duration::from_secs(env_or(
                "STUDENT_CACHE_TTL_SECS",
                default.student_cache_ttl.as_secs(),
            )),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            trend: TrendConfig {
                rapid_slope: env_or("TREND_RAPID_SLOPE", default.trend.rapid_slope),
                steady_slope: env_or("TREND_STEADY_SLOPE", default.trend.steady_slope),
                stable_epsilon: env_or("TREND_EPSILON", default.trend.stable_epsilon),
                strength_margin: env_or("TREND_STRENGTH_MARGIN", default.trend.strength_margin),
                target_score: env_or("TOPIK_TARGET_SCORE", default.trend.target_score),
            },
        }
    }

    /// 检查阈值之间的关系
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trend = &self.trend;
        if !(trend.stable_epsilon >= 0.0
            && trend.stable_epsilon < trend.steady_slope
            && trend.steady_slope < trend.rapid_slope)
        {
            return Err(ConfigError::InvalidValue {
                name: "trend".to_string(),
                reason: format!(
                    "需要 0 <= epsilon({}) < steady({}) < rapid({})",
                    trend.stable_epsilon, trend.steady_slope, trend.rapid_slope
                ),
            });
        }
        if trend.strength_margin < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "TREND_STRENGTH_MARGIN".to_string(),
                reason: "不能为负数".to_string(),
            });
        }
        if self.item_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "ITEM_TIMEOUT_SECS".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 读取环境变量，缺失时使用默认值，无法解析时记录警告并使用默认值
fn env_or<T: FromStr + Copy>(var_name: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                let err = ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value,
                    expected_type: std::any::type_name::<T>().to_string(),
                };
                warn!("⚠️ {}，使用默认值", err);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trend.rapid_slope, 10.0);
        assert_eq!(config.trend.steady_slope, 5.0);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = Config::default();
        config.trend.steady_slope = 20.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
