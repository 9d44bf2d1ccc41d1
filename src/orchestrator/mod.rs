//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量生成和流程调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量报告编排器
//! - 每个批次一个 worker，严格顺序执行
//! - 报告之间固定间隔（限速）
//! - 通过 `watch` 通道发布进度
//! - 只重试失败项，支持取消
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ReportRequest>)
//!     ↓
//! workflow::ReportFlow (处理单份报告)
//!     ↓
//! services (能力层：聚合 / 趋势 / 编译 / 渲染 / 登记)
//! ```

pub mod batch_processor;

pub use batch_processor::{
    BatchHandle, BatchItem, BatchItemStatus, BatchOrchestrator, BatchProgress,
};
