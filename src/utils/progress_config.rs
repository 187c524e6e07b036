// src/utils/progress_config.rs
//
// Terminal progress for the bucket fan-out. Only affects what is drawn,
// never what the pipeline computes.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::env;

const BUCKET_BAR_TEMPLATE: &str =
    "  {spinner:.cyan} [{elapsed_precise}] {bar:30.green/blue} {pos}/{len} buckets {msg}";

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Master switch; when off nothing is drawn and memory is not sampled.
    pub enabled: bool,
    /// Draw the per-bucket bar.
    pub detailed: bool,
    pub refresh_rate_ms: u64,
    /// Log process memory after the run.
    pub show_memory: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
            refresh_rate_ms: 100,
            show_memory: true,
        }
    }
}

/// Boolean-ish flag value; anything unrecognised keeps the default.
fn parse_flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

impl ProgressConfig {
    /// Reads `PROGRESS_ENABLED`, `PROGRESS_DETAILED`, `PROGRESS_SHOW_MEMORY` and
    /// `PROGRESS_REFRESH_RATE_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: parse_flag(env::var("PROGRESS_ENABLED").ok(), defaults.enabled),
            detailed: parse_flag(env::var("PROGRESS_DETAILED").ok(), defaults.detailed),
            refresh_rate_ms: env::var("PROGRESS_REFRESH_RATE_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.refresh_rate_ms),
            show_memory: parse_flag(env::var("PROGRESS_SHOW_MEMORY").ok(), defaults.show_memory),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            detailed: false,
            show_memory: false,
            ..Self::default()
        }
    }

    fn refresh_hz(&self) -> u8 {
        (1000 / self.refresh_rate_ms.max(1)).clamp(1, 60) as u8
    }

    pub fn create_multi_progress(&self) -> Option<MultiProgress> {
        self.enabled.then(|| {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(self.refresh_hz()))
        })
    }

    /// Bar over `len` buckets, attached to `multi_progress`.
    pub fn bucket_bar(&self, multi_progress: Option<&MultiProgress>, len: u64) -> Option<ProgressBar> {
        if !self.should_show_detailed() {
            return None;
        }
        let pb = multi_progress?.add(ProgressBar::new(len));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(BUCKET_BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        Some(pb)
    }

    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }

    pub fn should_show_memory(&self) -> bool {
        self.enabled && self.show_memory
    }
}
