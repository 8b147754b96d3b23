use crate::core::Pipeline;
use crate::domain::model::RecordCount;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(mut self) -> Result<String> {
        tracing::info!("Starting run...");
        if self.monitor.is_enabled() {
            tracing::info!("🔍 System monitoring enabled");
        }

        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.record_count());
        self.monitor.log_phase("Extract");

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!("Transformed {} records", transformed.record_count());
        self.monitor.log_phase("Transform");

        tracing::info!("Loading data...");
        let output = self.pipeline.load(transformed).await?;
        tracing::info!("Load finished: {}", output);
        self.monitor.log_phase("Load");

        self.monitor.log_final();
        Ok(output)
    }
}
