//! 学生 / 咨询记录存储 - 外部协作者
//!
//! 学生和咨询数据由 CRUD 层维护，这里只定义读取能力。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{AppResult, NotFoundError};
use crate::models::consultation::{ConsultationRecord, DateRange};
use crate::models::student::{Student, StudentId};

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// 学生不存在时返回 `NotFoundError::Student`
    async fn get_student(&self, id: StudentId) -> AppResult<Student>;

    /// 范围内的咨询记录，按日期升序
    async fn list_consultations(
        &self,
        student_id: StudentId,
        range: &DateRange,
    ) -> AppResult<Vec<ConsultationRecord>>;
}

/// 内存实现（用于命令行和测试）
#[derive(Debug, Default)]
pub struct InMemoryStore {
    students: HashMap<StudentId, Student>,
    consultations: Vec<ConsultationRecord>,
}

impl InMemoryStore {
    pub fn new(students: Vec<Student>, consultations: Vec<ConsultationRecord>) -> Self {
        Self {
            students: students.into_iter().map(|s| (s.id, s)).collect(),
            consultations,
        }
    }
}

#[async_trait]
impl StudentStore for InMemoryStore {
    async fn get_student(&self, id: StudentId) -> AppResult<Student> {
        self.students
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError::Student(id).into())
    }

    async fn list_consultations(
        &self,
        student_id: StudentId,
        range: &DateRange,
    ) -> AppResult<Vec<ConsultationRecord>> {
        let mut records: Vec<ConsultationRecord> = self
            .consultations
            .iter()
            .filter(|c| c.student_id == student_id && range.contains(c.date))
            .cloned()
            .collect();
        records.sort_by_key(|c| (c.date, c.id));
        Ok(records)
    }
}
