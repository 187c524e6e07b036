// src/utils/logging.rs - Tagged logging helpers for pipeline stages
use log::{debug, error, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Load,
    Normalize,
    Align,
    Cluster,
    Label,
    Output,
}

#[derive(Clone)]
pub struct StageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl StageLogger {
    pub fn new(stage: PipelineStage) -> Self {
        let (stage_name, stage_emoji) = match stage {
            PipelineStage::Load => ("LOAD", "📂"),
            PipelineStage::Normalize => ("NORMALIZE", "🧹"),
            PipelineStage::Align => ("ALIGN", "🗓️"),
            PipelineStage::Cluster => ("CLUSTER", "🧩"),
            PipelineStage::Label => ("LABEL", "🏷️"),
            PipelineStage::Output => ("OUTPUT", "💾"),
        };

        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, app_name: &str) {
        info!(
            "[{}] {} 🚀 Starting {} stage for {} (run ID: {})",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            app_name,
            run_id
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {} records",
            self.stage_name, self.stage_emoji, count, data_type
        );
    }

    pub fn log_bucket_start(&self, bucket: &str, review_count: usize, informative_count: usize) {
        info!(
            "[{}] {} ▶️  Processing bucket {} - {} reviews ({} informative)",
            self.stage_name, self.stage_emoji, bucket, review_count, informative_count
        );
    }

    pub fn log_bucket_skipped(&self, bucket: &str, informative_count: usize, minimum: usize) {
        info!(
            "[{}] {} ⏭️  Skipping bucket {} (not enough reviews: {} informative, need {})",
            self.stage_name, self.stage_emoji, bucket, informative_count, minimum
        );
    }

    pub fn log_clusters_found(&self, bucket: &str, clusters: usize, outliers: usize) {
        if clusters == 0 {
            info!(
                "[{}] {} 🤷 No good clusters found for bucket {} ({} outliers)",
                self.stage_name, self.stage_emoji, bucket, outliers
            );
        } else {
            info!(
                "[{}] {} ✨ Found {} clusters for bucket {} ({} outliers dropped)",
                self.stage_name, self.stage_emoji, clusters, bucket, outliers
            );
        }
    }

    pub fn log_cluster_discarded(&self, bucket: &str, cluster_id: usize, reason: &str) {
        info!(
            "[{}] {} 🗑️  Cluster {} in bucket {} discarded: {}",
            self.stage_name, self.stage_emoji, cluster_id, bucket, reason
        );
    }

    pub fn log_cluster_accepted(&self, bucket: &str, cluster_id: usize, label: &str, avg_score: Option<f64>) {
        let score = avg_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".to_string());
        info!(
            "[{}] {} ✅ Bucket {} - Cluster {}: {} - Average Score: {}",
            self.stage_name, self.stage_emoji, bucket, cluster_id, label, score
        );
    }

    pub fn log_completion(&self, summary: &str) {
        let elapsed = self.start_time.elapsed();
        info!(
            "[{}] {} 🏁 Completed: {} [{:.2?}]",
            self.stage_name, self.stage_emoji, summary, elapsed
        );
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_error(&self, message: &str) {
        error!("[{}] {} ❌ {}", self.stage_name, self.stage_emoji, message);
    }
}
