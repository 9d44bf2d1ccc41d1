use serde::{Deserialize, Serialize};
use std::fmt;

/// 学生 ID（由外部 CRUD 层分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub i64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 学生身份信息
///
/// 本模块只引用学生，不负责维护学生数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    /// 学号
    pub code: String,
    /// 显示名称（可选）
    #[serde(default)]
    pub name: Option<String>,
}

impl Student {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}
