//! # Student Report Pipeline
//!
//! 汇总学生咨询评价、分析 TOPIK 成绩趋势并批量生成多语言报告
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 学生、咨询记录、强类型评价、模板、报告登记行
//! - `models::loaders` - 从 TOML 数据目录加载（评价 JSON 在入库时解析一次）
//!
//! ### ② 业务能力层（Services）
//! - `EvaluationAggregator` - 按日期范围聚合档案（时点维度取最新）
//! - `TopikTrendAnalyzer` - 斜率、模式、强弱项、预测
//! - `ReportCompiler` - 校验并生成与渲染器无关的文档
//! - `StudentStore` / `Renderer` / `ReportRegistry` - 外部协作者接口
//!
//! ### ③ 流程层（Workflow）
//! - `ReportCtx` - 上下文封装（批次索引 + 请求）
//! - `ReportFlow` - 单份报告：聚合 → 分析 → 编译 → 登记 → 渲染 → 写文件
//! - `CancelToken` - 取消令牌
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 顺序队列、限速、进度、重试、取消

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::{Config, TrendConfig};
pub use error::{AppError, AppResult, ErrorKind};
pub use orchestrator::{BatchHandle, BatchItemStatus, BatchOrchestrator, BatchProgress};
pub use workflow::{CancelToken, ReportCtx, ReportFlow};
