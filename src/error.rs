use thiserror::Error;

use crate::models::consultation::ConsultationId;
use crate::models::report::{ReportId, ReportStatus};
use crate::models::student::StudentId;
use crate::models::template::{Language, RenderFormat, ReportField, ReportPurpose};
use crate::models::topik::Subscore;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 校验错误（缺少必填字段、正式报告缺少评语等）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 学生 / 咨询记录 / 模板 / 报告不存在
    #[error("未找到: {0}")]
    NotFound(#[from] NotFoundError),
    /// 渲染器错误
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
    /// 存储 / 报告登记表错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 单个报告生成超时
    #[error("超时: {operation} 超过 {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },
    /// 被取消令牌中断
    #[error("已取消: {0}")]
    Cancelled(String),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 错误类别（用于批量任务中的失败原因）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Render,
    Storage,
    Timeout,
    Cancelled,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Render => "RenderError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Render(_) => ErrorKind::Render,
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Timeout { .. } => ErrorKind::Timeout,
            AppError::Cancelled(_) => ErrorKind::Cancelled,
            AppError::Config(_) => ErrorKind::Config,
        }
    }

    /// 请求本身不成立（校验失败或资源不存在），不留下报告登记行
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::NotFound)
    }
}

/// 校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 模板要求的字段缺失（列出全部缺失字段）
    #[error("缺少必填字段: {}", join(.fields))]
    MissingFields { fields: Vec<ReportField> },
    /// 正式报告中选中的咨询缺少咨询老师评语（列出全部咨询 ID）
    #[error("以下咨询记录缺少咨询老师评语: {}", join(.consultation_ids))]
    MissingCounselorEvaluation { consultation_ids: Vec<ConsultationId> },
    /// 正式报告必须显式选择咨询记录
    #[error("{purpose} 报告必须显式选择咨询记录")]
    SelectionRequired { purpose: ReportPurpose },
    /// 模板不支持该用途
    #[error("模板 {template} 不支持用途 {purpose}")]
    UnsupportedPurpose {
        template: String,
        purpose: ReportPurpose,
    },
    /// 模板不支持该语言
    #[error("模板 {template} 不支持语言 {language}")]
    UnsupportedLanguage { template: String, language: Language },
    /// TOPIK 模考次数重复
    #[error("TOPIK 第 {test_number} 次模考重复")]
    DuplicateTestNumber { test_number: u8 },
    /// TOPIK 模考次数超出 1～8
    #[error("TOPIK 模考次数 {test_number} 超出范围 [1, {max}]")]
    TestNumberOutOfRange { test_number: u8, max: u8 },
    /// 单项分超出上限
    #[error("TOPIK 第 {test_number} 次 {subscore} 分数 {value} 超过上限 {max}")]
    SubscoreOutOfBounds {
        test_number: u8,
        subscore: Subscore,
        value: u32,
        max: u32,
    },
    /// 总分超出上限
    #[error("TOPIK 第 {test_number} 次总分 {value} 超过上限 {max}")]
    TotalOutOfBounds { test_number: u8, value: u32, max: u32 },
    /// 日期范围无效
    #[error("日期范围无效: {from} 晚于 {to}")]
    InvalidDateRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },
}

/// 资源不存在
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("学生 {0} 不存在")]
    Student(StudentId),
    #[error("咨询记录不存在: {}", join(.0))]
    Consultations(Vec<ConsultationId>),
    #[error("报告模板 {0} 不存在")]
    Template(String),
    #[error("报告 {0} 不存在")]
    Report(ReportId),
}

/// 渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 渲染器执行失败
    #[error("渲染 {format} 失败: {message}")]
    Failed { format: RenderFormat, message: String },
    /// 渲染器返回空内容
    #[error("渲染器返回了空内容 ({format})")]
    EmptyOutput { format: RenderFormat },
    /// 文档序列化失败
    #[error("文档序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 写入报告文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 非法的状态转换
    #[error("报告 {id} 不能从 {from} 变为 {to}")]
    InvalidTransition {
        id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值无效
    #[error("配置项 {name} 无效: {reason}")]
    InvalidValue { name: String, reason: String },
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建超时错误
    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        AppError::Timeout {
            operation: operation.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// 创建渲染失败错误
    pub fn render_failed(format: RenderFormat, message: impl Into<String>) -> Self {
        AppError::Render(RenderError::Failed {
            format,
            message: message.into(),
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = AppError::from(ValidationError::MissingFields {
            fields: vec![ReportField::TopikHistory, ReportField::Achievements],
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        let message = err.to_string();
        assert!(message.contains("topik_history"));
        assert!(message.contains("achievements"));
    }

    #[test]
    fn kind_display_uses_taxonomy_names() {
        let err = AppError::timeout("生成报告", std::time::Duration::from_secs(2));
        assert_eq!(err.kind().to_string(), "TimeoutError");
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn only_validation_and_not_found_are_rejections() {
        assert!(AppError::from(NotFoundError::Student(StudentId(9))).is_rejection());
        assert!(AppError::from(ValidationError::SelectionRequired {
            purpose: ReportPurpose::Visa,
        })
        .is_rejection());
        assert!(!AppError::Cancelled("stop".to_string()).is_rejection());
        assert!(!AppError::timeout("聚合", std::time::Duration::from_secs(1)).is_rejection());
    }
}
