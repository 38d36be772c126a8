// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus counters for the change-control pipeline, served at
//! `GET /metrics` in the exposition format. Counters only - the pipeline
//! has no interesting gauges, and latency lives in the request traces.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use taskdeck_domain::CoreError;

fn metrics_err(e: prometheus::Error) -> CoreError {
    CoreError::internal_error(format!("metrics error: {}", e))
}

pub struct MetricsService {
    registry: Registry,
    pub drafts_submitted: IntCounter,
    pub drafts_applied: IntCounter,
    pub drafts_discarded: IntCounter,
    pub audit_entries: IntCounter,
    pub rollbacks: IntCounter,
    http_requests: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self, CoreError> {
        let registry = Registry::new();

        let drafts_submitted = IntCounter::with_opts(Opts::new(
            "taskdeck_drafts_submitted_total",
            "Drafts accepted by the draft engine",
        ))
        .map_err(metrics_err)?;
        let drafts_applied = IntCounter::with_opts(Opts::new(
            "taskdeck_drafts_applied_total",
            "Drafts applied to the store",
        ))
        .map_err(metrics_err)?;
        let drafts_discarded = IntCounter::with_opts(Opts::new(
            "taskdeck_drafts_discarded_total",
            "Drafts discarded before apply",
        ))
        .map_err(metrics_err)?;
        let audit_entries = IntCounter::with_opts(Opts::new(
            "taskdeck_audit_entries_total",
            "Audit entries appended",
        ))
        .map_err(metrics_err)?;
        let rollbacks = IntCounter::with_opts(Opts::new(
            "taskdeck_rollbacks_total",
            "Audit entries rolled back",
        ))
        .map_err(metrics_err)?;
        let http_requests = IntCounterVec::new(
            Opts::new("taskdeck_http_requests_total", "HTTP requests served"),
            &["method", "status"],
        )
        .map_err(metrics_err)?;

        registry
            .register(Box::new(drafts_submitted.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(drafts_applied.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(drafts_discarded.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(audit_entries.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(rollbacks.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(http_requests.clone()))
            .map_err(metrics_err)?;

        Ok(Self {
            registry,
            drafts_submitted,
            drafts_applied,
            drafts_discarded,
            audit_entries,
            rollbacks,
            http_requests,
        })
    }

    pub fn observe_http(&self, method: &str, status: u16) {
        self.http_requests
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    /// Renders the registry in Prometheus exposition format.
    pub fn render(&self) -> Result<String, CoreError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(metrics_err)?;
        String::from_utf8(buffer)
            .map_err(|e| CoreError::internal_error(format!("metrics not utf-8: {}", e)))
    }
}
