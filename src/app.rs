//! 应用入口 - 负责装配各层并运行一个批次

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{load_batch_file, load_dataset, ReportRequest};
use crate::orchestrator::{BatchOrchestrator, BatchProgress};
use crate::services::{InMemoryRegistry, InMemoryStore, JsonRenderer, ReportRegistry};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::ReportFlow;

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: BatchOrchestrator,
}

impl App {
    /// 初始化应用：校验配置、加载数据、装配流程
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        log_startup(&config);

        info!("\n📁 正在加载数据目录: {}", config.data_folder);
        let dataset = load_dataset(&config.data_folder)
            .await
            .with_context(|| format!("加载数据目录失败: {}", config.data_folder))?;
        info!(
            "✓ 学生 {} 名, 咨询记录 {} 条, 模板 {} 个",
            dataset.students.len(),
            dataset.consultations.len(),
            dataset.templates.len()
        );

        let store = Arc::new(InMemoryStore::new(dataset.students, dataset.consultations));
        let registry: Arc<dyn ReportRegistry> = Arc::new(InMemoryRegistry::new());
        let flow = ReportFlow::new(
            &config,
            store,
            dataset.templates,
            Arc::new(JsonRenderer),
            registry,
        );
        let orchestrator = BatchOrchestrator::new(Arc::new(flow), config.inter_item_delay);

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let requests = self.load_requests().await?;

        if requests.is_empty() {
            warn!("⚠️ 批量文件中没有报告请求，程序结束");
            return Ok(());
        }

        let progress = self.process_batch(requests).await;
        print_final_stats(&progress, &self.config.output_folder);

        Ok(())
    }

    async fn load_requests(&self) -> Result<Vec<ReportRequest>> {
        info!("\n📋 正在读取批量请求: {}", self.config.batch_file);
        load_batch_file(Path::new(&self.config.batch_file))
            .await
            .with_context(|| format!("读取批量请求失败: {}", self.config.batch_file))
    }

    /// 运行批次，Ctrl+C 时取消
    async fn process_batch(&self, requests: Vec<ReportRequest>) -> BatchProgress {
        let handle = self.orchestrator.start(requests);

        tokio::select! {
            progress = handle.wait_until_settled() => progress,
            _ = tokio::signal::ctrl_c() => {
                warn!("⚠️ 收到中断信号，正在取消批次...");
                handle.cancel();
                handle.wait_until_settled().await
            }
        }
    }
}
