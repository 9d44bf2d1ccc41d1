//! 取消令牌
//!
//! 基于 `watch` 通道：一次取消，所有克隆都能观察到

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// 重复调用无副作用
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// 等待取消发生；已取消时立即返回
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // 发送端由 self 持有，不会提前关闭
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
