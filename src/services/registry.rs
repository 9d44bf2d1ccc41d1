//! 报告登记表 - 外部协作者
//!
//! 记录每次生成的结果。状态更新按主键单行原子执行，
//! 多个批次可以同时写入。

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppResult, NotFoundError, StorageError};
use crate::models::report::{GeneratedReport, NewReport, ReportId, ReportStatus, ReportUpdate};
use crate::models::student::StudentId;

#[async_trait]
pub trait ReportRegistry: Send + Sync {
    /// 新建一行，状态为 generating
    async fn create(&self, meta: NewReport) -> AppResult<ReportId>;

    /// 状态转换必须合法，否则返回 `StorageError::InvalidTransition`
    async fn update_status(
        &self,
        id: ReportId,
        status: ReportStatus,
        update: ReportUpdate,
    ) -> AppResult<GeneratedReport>;

    async fn get(&self, id: ReportId) -> AppResult<GeneratedReport>;

    async fn list_for_student(&self, student_id: StudentId) -> AppResult<Vec<GeneratedReport>>;
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    rows: BTreeMap<ReportId, GeneratedReport>,
}

/// 内存实现
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<GeneratedReport> {
        let state = self.state.lock().await;
        state.rows.values().cloned().collect()
    }
}

#[async_trait]
impl ReportRegistry for InMemoryRegistry {
    async fn create(&self, meta: NewReport) -> AppResult<ReportId> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = ReportId(state.next_id);
        debug!("登记报告 {} (学生 {})", id, meta.student_id);
        state
            .rows
            .insert(id, GeneratedReport::new(id, meta, Utc::now()));
        Ok(id)
    }

    async fn update_status(
        &self,
        id: ReportId,
        status: ReportStatus,
        update: ReportUpdate,
    ) -> AppResult<GeneratedReport> {
        let mut state = self.state.lock().await;
        let row = state
            .rows
            .get_mut(&id)
            .ok_or(NotFoundError::Report(id))?;

        if !row.status.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                id,
                from: row.status,
                to: status,
            }
            .into());
        }

        row.apply(status, update, Utc::now());
        debug!("报告 {} 状态更新为 {}", id, status);
        Ok(row.clone())
    }

    async fn get(&self, id: ReportId) -> AppResult<GeneratedReport> {
        let state = self.state.lock().await;
        state
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError::Report(id).into())
    }

    async fn list_for_student(&self, student_id: StudentId) -> AppResult<Vec<GeneratedReport>> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::template::{Language, ReportPurpose};

    fn meta(student: i64) -> NewReport {
        NewReport {
            student_id: StudentId(student),
            template_code: "routine".to_string(),
            language: Language::Ko,
            purpose: ReportPurpose::Routine,
        }
    }

    #[tokio::test]
    async fn completed_row_records_metadata() {
        let registry = InMemoryRegistry::new();
        let id = registry.create(meta(1)).await.unwrap();
        assert_eq!(registry.get(id).await.unwrap().status, ReportStatus::Generating);

        let row = registry
            .update_status(
                id,
                ReportStatus::Completed,
                ReportUpdate::completed("out/1.pdf".to_string(), 512, 40),
            )
            .await
            .unwrap();

        assert_eq!(row.status, ReportStatus::Completed);
        assert_eq!(row.file_size, Some(512));
        assert_eq!(row.generation_time_ms, Some(40));
        assert!(row.generated_at.is_some());
        assert!(row.error_message.is_none());
    }

    #[tokio::test]
    async fn illegal_transitions_are_rejected() {
        let registry = InMemoryRegistry::new();
        let id = registry.create(meta(1)).await.unwrap();
        registry
            .update_status(id, ReportStatus::Failed, ReportUpdate::failed("boom", 3))
            .await
            .unwrap();

        let err = registry
            .update_status(id, ReportStatus::Completed, ReportUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(StorageError::InvalidTransition { .. })
        ));

        let row = registry.get(id).await.unwrap();
        assert_eq!(row.status, ReportStatus::Failed);
        assert_eq!(row.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn completed_reports_can_be_archived() {
        let registry = InMemoryRegistry::new();
        let id = registry.create(meta(2)).await.unwrap();
        registry
            .update_status(
                id,
                ReportStatus::Completed,
                ReportUpdate::completed("out/2.pdf".to_string(), 10, 1),
            )
            .await
            .unwrap();
        let row = registry
            .update_status(id, ReportStatus::Archived, ReportUpdate::default())
            .await
            .unwrap();

        assert_eq!(row.status, ReportStatus::Archived);
        assert_eq!(row.pdf_path.as_deref(), Some("out/2.pdf"));
        assert_eq!(registry.list_for_student(StudentId(2)).await.unwrap().len(), 1);
        assert!(registry.list_for_student(StudentId(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_report_is_not_found() {
        let registry = InMemoryRegistry::new();
        let err = registry.get(ReportId(99)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(NotFoundError::Report(_))));
    }
}
