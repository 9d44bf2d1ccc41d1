//! 报告生成流程 - 流程层
//!
//! 核心职责：定义"一份报告"的完整生成流程
//!
//! 流程顺序：
//! 1. 聚合档案 → TOPIK 趋势分析 → 查找模板 → 编译
//! 2. 登记（generating）→ 渲染 → 写文件 → 标记 completed
//!
//! 失败登记规则：
//! - 校验失败或资源不存在：请求被拒绝，不留下任何登记行
//! - 其余失败（超时、取消、存储、渲染）：登记行标记为 failed 并写入错误信息
//!
//! 整个流程共用一个截止时间，并随时响应取消令牌。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, NotFoundError};
use crate::models::document::Document;
use crate::models::report::{GeneratedReport, NewReport, ReportId, ReportStatus, ReportUpdate};
use crate::models::student::Student;
use crate::models::template::ReportTemplate;
use crate::services::{
    ArtifactWriter, CompileRequest, EvaluationAggregator, Renderer, ReportCompiler,
    ReportRegistry, StudentStore, TopikTrendAnalyzer, WrittenArtifact,
};
use crate::workflow::cancel::CancelToken;
use crate::workflow::report_ctx::ReportCtx;

/// 编译阶段的产物
struct Compiled {
    student: Student,
    document: Document,
}

/// 报告生成流程
///
/// - 编排单份报告的完整生成过程
/// - 决定何时登记、何时标记失败
/// - 只依赖业务能力（services）和外部协作者（trait 对象）
pub struct ReportFlow {
    aggregator: EvaluationAggregator,
    analyzer: TopikTrendAnalyzer,
    compiler: ReportCompiler,
    templates: HashMap<String, ReportTemplate>,
    renderer: Arc<dyn Renderer>,
    registry: Arc<dyn ReportRegistry>,
    writer: ArtifactWriter,
    item_timeout: Duration,
}

impl ReportFlow {
    pub fn new(
        config: &Config,
        store: Arc<dyn StudentStore>,
        templates: Vec<ReportTemplate>,
        renderer: Arc<dyn Renderer>,
        registry: Arc<dyn ReportRegistry>,
    ) -> Self {
        Self {
            aggregator: EvaluationAggregator::new(store, config.student_cache_ttl),
            analyzer: TopikTrendAnalyzer::new(config.trend),
            compiler: ReportCompiler::new(),
            templates: templates
                .into_iter()
                .map(|t| (t.code.clone(), t))
                .collect(),
            renderer,
            registry,
            writer: ArtifactWriter::new(&config.output_folder),
            item_timeout: config.item_timeout,
        }
    }

    pub fn aggregator(&self) -> &EvaluationAggregator {
        &self.aggregator
    }

    /// 生成一份报告
    ///
    /// # 参数
    /// * `ctx` - 报告上下文（批次内索引 + 请求）
    /// * `cancel` - 取消令牌，触发后当前阶段立即中断
    ///
    /// # 返回
    /// 成功时返回状态为 completed 的登记行。
    /// 失败时返回错误；除被拒绝的请求外，登记表中都会留下一条 failed 行
    pub async fn generate(
        &self,
        ctx: &ReportCtx,
        cancel: &CancelToken,
    ) -> AppResult<GeneratedReport> {
        let started = Instant::now();
        let deadline = started + self.item_timeout;

        info!("{} 📝 开始生成报告", ctx);

        // ========== 阶段 1: 聚合 + 分析 + 编译 ==========
        let compiled = match self.guarded(deadline, cancel, self.compile(ctx)).await {
            Ok(compiled) => compiled,
            Err(e) if e.is_rejection() => {
                warn!("{} ⚠️ 请求被拒绝: {}", ctx, e);
                return Err(e);
            }
            Err(e) => {
                self.record_failure(ctx, started, &e).await;
                return Err(e);
            }
        };
        debug!("{} 文档编译完成: {} 个章节", ctx, compiled.document.sections.len());

        // ========== 阶段 2: 登记 + 渲染 + 写文件 ==========
        let report_id = match self
            .guarded(deadline, cancel, self.registry.create(new_report(ctx)))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.record_failure(ctx, started, &e).await;
                return Err(e);
            }
        };

        let outcome = self
            .guarded(deadline, cancel, self.publish(ctx, report_id, &compiled))
            .await;
        let took_ms = elapsed_ms(started);

        match outcome {
            Ok(artifact) => {
                let row = self
                    .registry
                    .update_status(
                        report_id,
                        ReportStatus::Completed,
                        ReportUpdate::completed(artifact.path, artifact.size, took_ms),
                    )
                    .await?;
                info!("{} ✓ 报告 {} 生成完成 ({} ms)", ctx, report_id, took_ms);
                Ok(row)
            }
            Err(e) => {
                self.mark_failed(ctx, report_id, &e, took_ms).await;
                Err(e)
            }
        }
    }

    /// 登记行尚未创建时失败：补登一条 failed 行
    async fn record_failure(&self, ctx: &ReportCtx, started: Instant, e: &AppError) {
        match self.registry.create(new_report(ctx)).await {
            Ok(report_id) => {
                self.mark_failed(ctx, report_id, e, elapsed_ms(started)).await
            }
            Err(create_err) => {
                error!("{} ❌ 生成失败: {}", ctx, e);
                warn!("{} ⚠️ 无法登记失败记录: {}", ctx, create_err);
            }
        }
    }

    async fn mark_failed(
        &self,
        ctx: &ReportCtx,
        report_id: ReportId,
        e: &AppError,
        took_ms: u64,
    ) {
        error!("{} ❌ 报告 {} 生成失败: {}", ctx, report_id, e);
        if let Err(mark_err) = self
            .registry
            .update_status(
                report_id,
                ReportStatus::Failed,
                ReportUpdate::failed(e.to_string(), took_ms),
            )
            .await
        {
            warn!("{} ⚠️ 无法标记报告 {} 为失败: {}", ctx, report_id, mark_err);
        }
    }

    async fn compile(&self, ctx: &ReportCtx) -> AppResult<Compiled> {
        let request = &ctx.request;

        let template = self
            .templates
            .get(&request.template_code)
            .ok_or_else(|| NotFoundError::Template(request.template_code.clone()))?;

        let profile = self
            .aggregator
            .aggregate(request.student_id, &request.date_range)
            .await?;
        let trend = self
            .analyzer
            .analyze(&profile.topik_results, template.score_bounds)?;

        debug!(
            "{} TOPIK 趋势: {} 次, 斜率 {:.2}, {:?}",
            ctx, trend.data_points, trend.slope, trend.pattern
        );

        let document = self.compiler.compile(&CompileRequest {
            profile: &profile,
            trend: &trend,
            template,
            language: request.language,
            purpose: request.purpose,
            selected: request.consultation_ids.as_deref(),
        })?;

        Ok(Compiled {
            student: profile.student,
            document,
        })
    }

    async fn publish(
        &self,
        ctx: &ReportCtx,
        report_id: ReportId,
        compiled: &Compiled,
    ) -> AppResult<WrittenArtifact> {
        let request = &ctx.request;
        let bytes = self.renderer.render(&compiled.document, request.format).await?;

        let file_name = ArtifactWriter::file_name(
            &compiled.student.code,
            &request.template_code,
            request.language,
            report_id,
            self.renderer.file_extension(request.format),
        );
        self.writer.write(&file_name, &bytes).await
    }

    /// 在截止时间和取消令牌的约束下执行
    async fn guarded<T>(
        &self,
        deadline: Instant,
        cancel: &CancelToken,
        work: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled("报告生成被取消".to_string())),
            result = timeout_at(deadline, work) => match result {
                Ok(inner) => inner,
                Err(_) => Err(AppError::timeout("报告生成", self.item_timeout)),
            },
        }
    }
}

fn new_report(ctx: &ReportCtx) -> NewReport {
    let request = &ctx.request;
    NewReport {
        student_id: request.student_id,
        template_code: request.template_code.clone(),
        language: request.language,
        purpose: request.purpose,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
