//! Metrics collection and registry.

use crate::controller::FlowStats;
use crate::session::Step;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of flow state for metrics update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Current step of the flow.
    pub step: Step,
    /// Whether the camera stream is held.
    pub camera_active: bool,
    /// Images stored into the session.
    pub captures: u64,
    /// Camera captures abandoned before reaching the session.
    pub aborted_captures: u64,
    /// Captures dropped as stale.
    pub stale_captures: u64,
    /// Failed camera acquisitions.
    pub acquisition_failures: u64,
    /// Uploads that could not be read.
    pub upload_failures: u64,
    /// Submissions delivered.
    pub submissions: u64,
}

/// Prometheus metrics registry for capture flow monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Flow state
    step: IntGauge,
    camera_active: IntGauge,

    // Capture counters
    captures_total: IntCounter,
    aborted_captures_total: IntCounter,
    stale_captures_total: IntCounter,

    // Failure counters
    acquisition_failures_total: IntCounter,
    upload_failures_total: IntCounter,

    // Output
    submissions_total: IntCounter,
}

/// Numeric code of a step for the step gauge.
fn step_code(step: Step) -> i64 {
    match step {
        Step::Selection => 0,
        Step::ChooseMethod => 1,
        Step::Camera => 2,
        Step::Upload => 3,
        Step::Success => 4,
    }
}

fn sync_counter(counter: &IntCounter, total: u64) {
    // Counters only move forward, so apply the difference
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all flow metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let step = IntGauge::new(
            "id_capture_step",
            "Current flow step (0=selection, 1=choose method, 2=camera, 3=upload, 4=success)",
        )?;
        let camera_active = IntGauge::new(
            "id_capture_camera_active",
            "Whether a camera stream is held (1=held, 0=released)",
        )?;
        let captures_total = IntCounter::new(
            "id_capture_captures_total",
            "Total images stored into the session",
        )?;
        let aborted_captures_total = IntCounter::new(
            "id_capture_aborted_captures_total",
            "Total camera captures aborted before storing an image",
        )?;
        let stale_captures_total = IntCounter::new(
            "id_capture_stale_captures_total",
            "Total captures dropped because the flow had moved on",
        )?;
        let acquisition_failures_total = IntCounter::new(
            "id_capture_acquisition_failures_total",
            "Total failed camera acquisitions",
        )?;
        let upload_failures_total = IntCounter::new(
            "id_capture_upload_failures_total",
            "Total uploads that could not be read",
        )?;
        let submissions_total = IntCounter::new(
            "id_capture_submissions_total",
            "Total submissions delivered",
        )?;

        registry.register(Box::new(step.clone()))?;
        registry.register(Box::new(camera_active.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(aborted_captures_total.clone()))?;
        registry.register(Box::new(stale_captures_total.clone()))?;
        registry.register(Box::new(acquisition_failures_total.clone()))?;
        registry.register(Box::new(upload_failures_total.clone()))?;
        registry.register(Box::new(submissions_total.clone()))?;

        Ok(Self {
            registry,
            step,
            camera_active,
            captures_total,
            aborted_captures_total,
            stale_captures_total,
            acquisition_failures_total,
            upload_failures_total,
            submissions_total,
        })
    }

    /// Updates all metrics from a snapshot of flow state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.step.set(step_code(snapshot.step));
        self.camera_active.set(i64::from(snapshot.camera_active));

        sync_counter(&self.captures_total, snapshot.captures);
        sync_counter(&self.aborted_captures_total, snapshot.aborted_captures);
        sync_counter(&self.stale_captures_total, snapshot.stale_captures);
        sync_counter(&self.acquisition_failures_total, snapshot.acquisition_failures);
        sync_counter(&self.upload_failures_total, snapshot.upload_failures);
        sync_counter(&self.submissions_total, snapshot.submissions);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from controller counters and the current step.
    pub fn from_stats(stats: &FlowStats, step: Step, camera_active: bool) -> Self {
        Self {
            step,
            camera_active,
            captures: stats.captures,
            aborted_captures: stats.aborted_captures,
            stale_captures: stats.stale_captures,
            acquisition_failures: stats.acquisition_failures,
            upload_failures: stats.upload_failures,
            submissions: stats.submissions,
        }
    }

    /// Creates a snapshot from a live controller.
    pub fn from_controller<C, S>(controller: &crate::FlowController<C, S>) -> Self
    where
        C: crate::capture::Camera,
        S: crate::payload::PayloadSink,
    {
        Self::from_stats(
            controller.stats(),
            controller.session().step(),
            controller.camera().is_active(),
        )
    }
}
