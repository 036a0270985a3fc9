use crate::app_state::AppEvent;
use crate::commands::{AppCommand, HELP};
use crate::dataset::{read_orders, validate, OrderRecord};
use crate::generate::{generate_to_file, GeneratorConfig};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const SHOWN_VIOLATIONS: usize = 5;

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Background side of the dashboard. Owns the dataset path and the active
/// generator config; file work runs on the blocking pool so the UI loop
/// never stalls.
pub struct DashboardService {
    path: PathBuf,
    config: GeneratorConfig,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
}

impl DashboardService {
    pub fn new(
        path: PathBuf,
        config: GeneratorConfig,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            path,
            config,
            evt_tx,
        }
    }

    fn emit(&self, evt: AppEvent) {
        let _ = self.evt_tx.send(evt);
    }

    /// Loads (or first generates) the dataset, then serves commands until
    /// the sender side is dropped or `quit` arrives.
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<AppCommand>) {
        if self.path.exists() {
            self.reload().await;
        } else {
            self.emit(AppEvent::Message(format!(
                "未找到数据集 {}，开始生成...",
                self.path.display()
            )));
            self.regenerate(None, None).await;
        }

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                AppCommand::Reload => self.reload().await,
                AppCommand::Generate { rows, seed } => self.regenerate(rows, seed).await,
                AppCommand::Validate => self.validate().await,
                AppCommand::Help => self.emit(AppEvent::Message(HELP.to_string())),
                AppCommand::Quit => {
                    info!("dashboard service stopping");
                    break;
                }
                AppCommand::Filter(f) => {
                    self.emit(AppEvent::Error(format!("筛选命令应在界面端处理: {:?}", f)))
                }
                AppCommand::Unknown(msg) => self.emit(AppEvent::Error(msg)),
            }
        }
    }

    async fn load(&self) -> anyhow::Result<Vec<OrderRecord>> {
        let path = self.path.clone();
        blocking(move || Ok(read_orders(&path)?)).await
    }

    async fn reload(&self) {
        match self.load().await {
            Ok(orders) => {
                info!("loaded {} orders from {}", orders.len(), self.path.display());
                self.emit(AppEvent::Dataset {
                    path: self.path.clone(),
                    orders: Arc::new(orders),
                });
            }
            Err(e) => {
                error!("reload failed: {:#}", e);
                self.emit(AppEvent::Error(format!("加载失败: {:#}", e)));
            }
        }
    }

    /// Explicit arguments override the active config; a successful run
    /// makes the overridden config the new baseline for `validate`.
    async fn regenerate(&mut self, rows: Option<usize>, seed: Option<u64>) {
        let mut config = self.config.clone();
        if let Some(rows) = rows {
            config.rows = rows;
        }
        if seed.is_some() {
            config.seed = seed;
        }
        self.emit(AppEvent::Message(format!(
            "正在生成 {} 条订单 (seed: {})...",
            config.rows,
            config
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string())
        )));

        let path = self.path.clone();
        let job_config = config.clone();
        match blocking(move || generate_to_file(&job_config, &path)).await {
            Ok(res) => {
                self.config = config;
                self.emit(AppEvent::Log(format!(
                    "✓ 生成完成: {} 条订单, {} 位顾客, {} 单使用折扣, 收入 {}",
                    res.rows, res.customers, res.discounted, res.revenue
                )));
                self.reload().await;
            }
            Err(e) => {
                error!("generation failed: {:#}", e);
                self.emit(AppEvent::Error(format!("生成失败: {:#}", e)));
            }
        }
    }

    async fn validate(&self) {
        let orders = match self.load().await {
            Ok(o) => o,
            Err(e) => {
                self.emit(AppEvent::Error(format!("加载失败: {:#}", e)));
                return;
            }
        };
        let report = validate(&orders, &self.config);
        if report.is_ok() {
            self.emit(AppEvent::Message(format!("✓ 校验通过: {} 行", report.rows)));
            return;
        }
        self.emit(AppEvent::Error(format!(
            "校验失败: {} 行中发现 {} 处问题",
            report.rows, report.total_violations
        )));
        for v in report.violations.iter().take(SHOWN_VIOLATIONS) {
            let at = match v.row {
                Some(r) => format!("第 {} 行 {}", r + 1, v.order_id),
                None => "数据集".to_string(),
            };
            self.emit(AppEvent::Log(format!("  {}: {}", at, v.kind)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next_dataset(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Arc<Vec<OrderRecord>> {
        let wait = async {
            loop {
                match rx.recv().await.expect("service hung up") {
                    AppEvent::Dataset { orders, .. } => return orders,
                    AppEvent::Error(e) => panic!("unexpected error: {}", e),
                    _ => {}
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(60), wait)
            .await
            .expect("timed out waiting for dataset")
    }

    async fn next_message(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> String {
        match tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out")
            .expect("service hung up")
        {
            AppEvent::Message(m) | AppEvent::Log(m) | AppEvent::Error(m) => m,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn generates_missing_dataset_then_serves_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let config = GeneratorConfig {
            rows: 200,
            seed: Some(1),
            ..Default::default()
        };
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(DashboardService::new(path.clone(), config, evt_tx).run(cmd_rx));

        let first = next_dataset(&mut evt_rx).await;
        assert_eq!(first.len(), 200);
        assert!(path.exists());

        cmd_tx
            .send(AppCommand::Generate {
                rows: Some(300),
                seed: Some(2),
            })
            .unwrap();
        let second = next_dataset(&mut evt_rx).await;
        assert_eq!(second.len(), 300);

        cmd_tx.send(AppCommand::Validate).unwrap();
        assert!(next_message(&mut evt_rx).await.contains("校验通过"));

        cmd_tx.send(AppCommand::Quit).unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn reports_unreadable_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "not,a,dataset\n").unwrap();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        tokio::spawn(DashboardService::new(path, GeneratorConfig::default(), evt_tx).run(cmd_rx));

        let msg = next_message(&mut evt_rx).await;
        assert!(msg.contains("加载失败"), "{}", msg);
    }
}
