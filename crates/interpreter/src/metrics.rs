// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Invoke profiling metrics.
//!
//! [`InvokeMetrics`] collects per-operator and total wall-clock time for a
//! single `invoke`. The image pipeline logs the total in microseconds.

use model_ir::OpCode;
use std::time::Duration;

/// Timing for a single operator.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpMetrics {
    /// Operator position in the graph.
    pub index: usize,
    pub opcode: OpCode,
    /// Name of the kernel that ran it.
    pub kernel: String,
    pub duration: Duration,
}

/// Aggregate metrics for one invoke.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvokeMetrics {
    /// Wall-clock time for the whole invoke.
    pub total_duration: Duration,
    /// Sum of the operator durations.
    pub compute_duration: Duration,
    pub ops: Vec<OpMetrics>,
}

impl InvokeMetrics {
    pub fn new(num_ops: usize) -> Self {
        Self {
            total_duration: Duration::ZERO,
            compute_duration: Duration::ZERO,
            ops: Vec::with_capacity(num_ops),
        }
    }

    /// Records one operator's timing.
    pub fn record_op(&mut self, index: usize, opcode: OpCode, kernel: &str, duration: Duration) {
        self.compute_duration += duration;
        self.ops.push(OpMetrics {
            index,
            opcode,
            kernel: kernel.to_string(),
            duration,
        });
    }

    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Total invoke time in whole microseconds.
    pub fn total_micros(&self) -> u128 {
        self.total_duration.as_micros()
    }

    /// The operator that took longest, if any ran.
    pub fn slowest_op(&self) -> Option<&OpMetrics> {
        self.ops.iter().max_by_key(|m| m.duration)
    }

    /// Time spent per opcode, in first-seen order.
    pub fn by_opcode(&self) -> Vec<(OpCode, Duration)> {
        let mut totals: Vec<(OpCode, Duration)> = Vec::new();
        for m in &self.ops {
            match totals.iter_mut().find(|(op, _)| *op == m.opcode) {
                Some((_, d)) => *d += m.duration,
                None => totals.push((m.opcode, m.duration)),
            }
        }
        totals
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let overhead = self.total_duration.saturating_sub(self.compute_duration);
        let slowest = self
            .slowest_op()
            .map(|m| format!(", slowest #{} {} ({}us)", m.index, m.opcode, m.duration.as_micros()))
            .unwrap_or_default();
        format!(
            "Invoke: {}us total, {} ops, {}us compute, {}us overhead{}",
            self.total_micros(),
            self.ops.len(),
            self.compute_duration.as_micros(),
            overhead.as_micros(),
            slowest,
        )
    }
}
