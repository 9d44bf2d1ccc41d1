//! 批量报告生成 - 编排层
//!
//! ## 职责
//!
//! 1. **队列调度**：每个批次一个 worker 任务，严格按顺序逐个生成
//! 2. **限速**：每份报告完成（无论成败）后等待固定间隔
//! 3. **进度发布**：通过 `watch` 通道发布快照，调用方可轮询或订阅
//! 4. **失败重试**：只接受当前处于 failed 的索引，重新入队
//! 5. **取消**：中断正在生成的报告，剩余报告保持 waiting
//!
//! ## 设计特点
//!
//! - 单个报告失败不会中止批次
//! - 批次之间除报告登记表外不共享任何状态

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, ErrorKind};
use crate::models::report::ReportId;
use crate::models::request::ReportRequest;
use crate::utils::logging::{log_batch_complete, log_batch_start, truncate_text};
use crate::workflow::{CancelToken, ReportCtx, ReportFlow};

/// 单个报告在批次中的状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchItemStatus {
    Waiting,
    Processing,
    Completed { report_id: ReportId },
    Failed { kind: ErrorKind, message: String },
}

impl BatchItemStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchItemStatus::Failed { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BatchItemStatus::Waiting | BatchItemStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub request: ReportRequest,
    pub status: BatchItemStatus,
    /// 已开始生成的次数（含重试）
    pub attempts: u32,
}

/// 批次进度快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub batch_id: u64,
    pub total: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    /// 正在生成的报告索引
    pub current_index: Option<usize>,
    pub cancelled: bool,
    pub items: Vec<BatchItem>,
}

impl BatchProgress {
    fn new(batch_id: u64, requests: Vec<ReportRequest>) -> Self {
        let items: Vec<BatchItem> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| BatchItem {
                index,
                request,
                status: BatchItemStatus::Waiting,
                attempts: 0,
            })
            .collect();
        Self {
            batch_id,
            total: items.len(),
            completed_count: 0,
            failed_count: 0,
            current_index: None,
            cancelled: false,
            items,
        }
    }

    fn set_status(&mut self, index: usize, status: BatchItemStatus) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = status;
        }
        self.completed_count = self
            .items
            .iter()
            .filter(|i| matches!(i.status, BatchItemStatus::Completed { .. }))
            .count();
        self.failed_count = self.items.iter().filter(|i| i.status.is_failed()).count();
    }

    /// 没有正在进行的工作：全部结束，或已取消且当前报告已中断
    pub fn is_settled(&self) -> bool {
        self.current_index.is_none()
            && (self.cancelled || self.items.iter().all(|i| !i.status.is_pending()))
    }

    /// 已接受但尚未开始的重试：processing 且不是当前报告
    fn abandon_pending_retries(&mut self) {
        let pending: Vec<usize> = self
            .items
            .iter()
            .filter(|i| {
                i.status == BatchItemStatus::Processing && Some(i.index) != self.current_index
            })
            .map(|i| i.index)
            .collect();
        for index in pending {
            self.set_status(
                index,
                BatchItemStatus::Failed {
                    kind: ErrorKind::Cancelled,
                    message: "批次已取消，重试未开始".to_string(),
                },
            );
        }
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|i| i.status.is_failed())
            .map(|i| i.index)
            .collect()
    }
}

/// 批量编排器
pub struct BatchOrchestrator {
    flow: Arc<ReportFlow>,
    inter_item_delay: Duration,
    next_batch_id: AtomicU64,
}

impl BatchOrchestrator {
    pub fn new(flow: Arc<ReportFlow>, inter_item_delay: Duration) -> Self {
        Self {
            flow,
            inter_item_delay,
            next_batch_id: AtomicU64::new(1),
        }
    }

    pub fn flow(&self) -> &Arc<ReportFlow> {
        &self.flow
    }

    /// 启动一个批次，立即返回句柄
    ///
    /// # 参数
    /// * `requests` - 按顺序生成的报告请求
    ///
    /// # 返回
    /// 批次句柄，用于查询进度、重试和取消
    pub fn start(&self, requests: Vec<ReportRequest>) -> BatchHandle {
        let batch_id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        let total = requests.len();
        let (progress_tx, _) = watch::channel(BatchProgress::new(batch_id, requests));
        let progress = Arc::new(progress_tx);
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();

        log_batch_start(batch_id, total, self.inter_item_delay);

        let worker = BatchWorker {
            batch_id,
            flow: self.flow.clone(),
            inter_item_delay: self.inter_item_delay,
            progress: progress.clone(),
            retries: retry_rx,
            cancel: cancel.clone(),
            queue: (0..total).collect(),
        };
        tokio::spawn(worker.run());

        BatchHandle {
            batch_id,
            progress,
            retries: retry_tx,
            cancel,
        }
    }
}

/// 批次句柄
///
/// 句柄被丢弃后 worker 在队列清空时退出
pub struct BatchHandle {
    batch_id: u64,
    progress: Arc<watch::Sender<BatchProgress>>,
    retries: mpsc::UnboundedSender<Vec<usize>>,
    cancel: CancelToken,
}

impl BatchHandle {
    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn snapshot(&self) -> BatchProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// 等待批次进入稳定状态（全部结束或已取消）
    pub async fn wait_until_settled(&self) -> BatchProgress {
        let mut rx = self.progress.subscribe();
        // 借用的快照必须在 rx 之前释放
        let settled = match rx.wait_for(BatchProgress::is_settled).await {
            Ok(progress) => progress.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    /// 重试失败的报告
    ///
    /// # 参数
    /// * `indices` - 希望重试的报告索引，非 failed、重复或越界的索引会被忽略
    ///
    /// # 返回
    /// 被接受的索引（已变为 processing 并重新入队）。批次已取消时返回 `Cancelled`
    pub fn retry_failed(&self, indices: &[usize]) -> AppResult<Vec<usize>> {
        let mut accepted = Vec::new();
        let mut cancelled = false;
        self.progress.send_modify(|progress| {
            if progress.cancelled {
                cancelled = true;
                return;
            }
            for &index in indices {
                let is_failed = progress
                    .items
                    .get(index)
                    .map_or(false, |item| item.status.is_failed());
                if is_failed && !accepted.contains(&index) {
                    progress.set_status(index, BatchItemStatus::Processing);
                    accepted.push(index);
                }
            }
        });

        if cancelled {
            return Err(AppError::Cancelled(format!("批次 {} 已取消", self.batch_id)));
        }
        if accepted.is_empty() {
            debug!("[批次 {}] 没有可重试的报告", self.batch_id);
            return Ok(accepted);
        }

        info!("[批次 {}] 🔁 重试 {} 份报告: {:?}", self.batch_id, accepted.len(), accepted);
        if self.retries.send(accepted.clone()).is_err() {
            warn!("[批次 {}] ⚠️ worker 已退出，无法重试", self.batch_id);
            self.progress.send_modify(|progress| {
                for &index in &accepted {
                    progress.set_status(
                        index,
                        BatchItemStatus::Failed {
                            kind: ErrorKind::Cancelled,
                            message: "批次已停止".to_string(),
                        },
                    );
                }
            });
            return Err(AppError::Cancelled(format!("批次 {} 已停止", self.batch_id)));
        }
        Ok(accepted)
    }

    /// 取消批次
    ///
    /// - 正在生成的报告被中断，随后标记为 failed
    /// - 从未开始的报告保持 waiting
    /// - 已接受但未开始的重试回到 failed（Cancelled）
    pub fn cancel(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        info!("[批次 {}] ⏹ 收到取消请求", self.batch_id);
        self.progress.send_modify(|progress| {
            progress.cancelled = true;
            progress.abandon_pending_retries();
        });
        self.cancel.cancel();
    }
}

struct BatchWorker {
    batch_id: u64,
    flow: Arc<ReportFlow>,
    inter_item_delay: Duration,
    progress: Arc<watch::Sender<BatchProgress>>,
    retries: mpsc::UnboundedReceiver<Vec<usize>>,
    cancel: CancelToken,
    queue: VecDeque<usize>,
}

impl BatchWorker {
    async fn run(mut self) {
        loop {
            while let Ok(indices) = self.retries.try_recv() {
                self.queue.extend(indices);
            }

            let index = match self.queue.pop_front() {
                Some(index) => index,
                None => {
                    let settled = self.progress.borrow().clone();
                    if settled.is_settled() {
                        log_batch_complete(&settled);
                    }
                    // 队列为空：等待重试或取消
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        received = self.retries.recv() => match received {
                            Some(indices) => self.queue.extend(indices),
                            None => break,
                        },
                    }
                    continue;
                }
            };

            if self.cancel.is_cancelled() {
                self.queue.push_front(index);
                break;
            }

            self.process(index).await;

            if self.cancel.is_cancelled() {
                break;
            }

            // 限速：每份报告之后固定等待
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.inter_item_delay) => {}
            }
        }

        self.finish();
    }

    async fn process(&mut self, index: usize) {
        // 取消与开始在同一次修改中判定，已取消的批次不再开始新报告
        let mut request = None;
        self.progress.send_modify(|progress| {
            if progress.cancelled {
                return;
            }
            let Some(item) = progress.items.get_mut(index) else {
                return;
            };
            if !item.status.is_pending() {
                return;
            }
            item.attempts += 1;
            request = Some(item.request.clone());
            progress.current_index = Some(index);
            progress.set_status(index, BatchItemStatus::Processing);
        });
        let Some(request) = request else {
            debug!("[批次 {}] 报告#{} 未开始", self.batch_id, index + 1);
            return;
        };
        let ctx = ReportCtx::new(index, request);

        let status = match self.flow.generate(&ctx, &self.cancel).await {
            Ok(report) => BatchItemStatus::Completed {
                report_id: report.id,
            },
            Err(e) => {
                warn!(
                    "[批次 {}] {} ❌ {}: {}",
                    self.batch_id,
                    ctx,
                    e.kind(),
                    truncate_text(&e.to_string(), 200)
                );
                BatchItemStatus::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        self.progress.send_modify(|progress| {
            progress.set_status(index, status);
            progress.current_index = None;
        });
    }

    /// 退出时把已入队但未开始的重试标记回 failed
    fn finish(self) {
        self.progress.send_modify(|progress| {
            progress.current_index = None;
            progress.abandon_pending_retries();
        });

        if self.cancel.is_cancelled() {
            let progress = self.progress.borrow();
            info!(
                "[批次 {}] ⏹ 已取消: 完成 {}, 失败 {}, 未开始 {}",
                self.batch_id,
                progress.completed_count,
                progress.failed_count,
                progress.items.iter().filter(|i| i.status.is_pending()).count()
            );
        }
        debug!("[批次 {}] worker 退出", self.batch_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::StudentId;
    use crate::models::template::Language;

    fn progress(n: i64) -> BatchProgress {
        let requests = (1..=n)
            .map(|id| ReportRequest::routine(StudentId(id), "routine", Language::Ko))
            .collect();
        BatchProgress::new(1, requests)
    }

    #[test]
    fn counts_follow_item_status() {
        let mut progress = progress(3);
        assert!(!progress.is_settled());

        progress.set_status(
            0,
            BatchItemStatus::Completed {
                report_id: ReportId(1),
            },
        );
        progress.set_status(
            1,
            BatchItemStatus::Failed {
                kind: ErrorKind::Render,
                message: "boom".to_string(),
            },
        );
        assert_eq!(progress.completed_count, 1);
        assert_eq!(progress.failed_count, 1);
        assert_eq!(progress.failed_indices(), vec![1]);
        assert!(!progress.is_settled());

        progress.set_status(
            2,
            BatchItemStatus::Completed {
                report_id: ReportId(2),
            },
        );
        assert!(progress.is_settled());
    }

    #[test]
    fn cancelled_batch_settles_with_waiting_items() {
        let mut progress = progress(2);
        progress.cancelled = true;
        assert!(progress.is_settled());

        progress.current_index = Some(0);
        assert!(!progress.is_settled());
    }

    #[test]
    fn abandoned_retries_return_to_failed_but_current_item_stays() {
        let mut progress = progress(3);
        progress.set_status(0, BatchItemStatus::Processing);
        progress.set_status(1, BatchItemStatus::Processing);
        progress.current_index = Some(1);

        progress.abandon_pending_retries();

        assert!(matches!(
            progress.items[0].status,
            BatchItemStatus::Failed {
                kind: ErrorKind::Cancelled,
                ..
            }
        ));
        assert_eq!(progress.items[1].status, BatchItemStatus::Processing);
        assert_eq!(progress.items[2].status, BatchItemStatus::Waiting);
        assert_eq!(progress.failed_count, 1);
    }

    #[test]
    fn empty_batch_is_settled_immediately() {
        assert!(progress(0).is_settled());
    }
}
