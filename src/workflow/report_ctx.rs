//! 报告生成上下文
//!
//! 封装"我正在处理批次中的第几份报告、是谁的报告"这一信息

use std::fmt::Display;

use crate::models::request::ReportRequest;

/// 报告生成上下文
#[derive(Debug, Clone)]
pub struct ReportCtx {
    /// 在批次中的索引（从0开始）
    pub index: usize,

    /// 生成请求
    pub request: ReportRequest,
}

impl ReportCtx {
    pub fn new(index: usize, request: ReportRequest) -> Self {
        Self { index, request }
    }
}

impl Display for ReportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[报告#{} 学生 ID#{} 模板#{} 语言#{}]",
            self.index + 1,
            self.request.student_id,
            self.request.template_code,
            self.request.language
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::StudentId;
    use crate::models::template::Language;

    #[test]
    fn display_names_student_template_and_language() {
        let ctx = ReportCtx::new(
            2,
            ReportRequest::routine(StudentId(7), "routine-basic", Language::Vi),
        );
        assert_eq!(ctx.to_string(), "[报告#3 学生 ID#7 模板#routine-basic 语言#vi]");
    }
}
