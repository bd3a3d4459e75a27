// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `flash-infer inspect`: display a model's graph and its arena plan.
//!
//! Loads the blob, lists every operator with the kernel that would run it,
//! then plans the intermediate tensors and checks the plan against an
//! arena size.

use std::path::PathBuf;

use anyhow::Context;
use image_pipeline::RunnerConfig;
use interpreter::{MemoryPlan, ARENA_ALIGNMENT};
use model_ir::Model;
use tensor_arena::ByteSize;

pub fn execute(config: &RunnerConfig, model: PathBuf, arena: Option<String>) -> anyhow::Result<()> {
    let model = Model::open(&model)
        .with_context(|| format!("failed to load model from '{}'", model.display()))?;
    let graph = model.graph();
    let arena_label = arena.unwrap_or_else(|| config.arena_size.clone());
    let arena_size = ByteSize::parse(&arena_label)
        .map_err(|e| anyhow::anyhow!("invalid arena size '{arena_label}': {e}"))?;

    // ── Summary ────────────────────────────────────────────────
    println!("  {}", model.summary());
    if let Some(description) = &graph.description {
        println!("  {description}");
    }
    println!("  {}", graph.summary());
    println!();

    // ── Operators ──────────────────────────────────────────────
    let resolver = image_pipeline::device_resolver()?;
    println!("  {:<4} {:<22} {:<28} {:<18}", "Idx", "Operator", "Tensors", "Kernel");
    println!("  {}", "-".repeat(76));
    for (index, op) in graph.iter_operators().enumerate() {
        let kernel = resolver
            .find(op.opcode)
            .map_or_else(|| "UNSUPPORTED".to_string(), |k| k.name().to_string());
        let inputs: Vec<String> = op
            .inputs
            .iter()
            .map(|i| i.map_or_else(|| "-".to_string(), |i| i.to_string()))
            .collect();
        let tensors = format!("({}) -> {}", inputs.join(","), op.output());
        println!("  {:<4} {:<22} {:<28} {:<18}", index, op.opcode.as_str(), tensors, kernel);
    }
    println!();

    // ── Tensors ────────────────────────────────────────────────
    let plan = MemoryPlan::new(graph).context("failed to plan arena")?;
    println!(
        "  {:<4} {:<20} {:<16} {:<6} {:>8} {:>10} {:>9}",
        "Idx", "Name", "Shape", "Type", "Bytes", "Region", "Live"
    );
    println!("  {}", "-".repeat(80));
    for (index, tensor) in graph.tensors.iter().enumerate() {
        let (region, live) = match (plan.region(index), plan.request(index)) {
            (Some(r), Some(req)) => (
                format!("@{}", r.offset),
                format!("{}..={}", req.first_use, req.last_use),
            ),
            _ if tensor.constant => ("const".to_string(), "-".to_string()),
            _ => ("-".to_string(), "-".to_string()),
        };
        println!(
            "  {:<4} {:<20} {:<16} {:<6} {:>8} {:>10} {:>9}",
            index,
            truncate(&tensor.name, 20),
            tensor.shape.to_string(),
            tensor.dtype.to_string(),
            tensor.size_bytes(),
            region,
            live,
        );
    }
    println!();

    // ── Arena ──────────────────────────────────────────────────
    let arena_plan = plan.arena_plan();
    let required = plan.required_bytes();
    println!("  Arena plan ({ARENA_ALIGNMENT}-byte aligned):");
    println!("   Buffers:          {}", plan.requests().len());
    println!("   Without reuse:    {} bytes", arena_plan.naive_bytes);
    println!("   Planned:          {required} bytes");
    println!("   Configured arena: {arena_size} ({} bytes)", arena_size.as_bytes());
    if arena_size.as_bytes() == 0 {
        println!("   Verdict:          arena is empty, allocation will fail");
    } else if required > arena_size.as_bytes() {
        println!(
            "   Verdict:          too small by {} bytes",
            required - arena_size.as_bytes()
        );
    } else {
        println!(
            "   Verdict:          fits, {} bytes spare",
            arena_size.as_bytes() - required
        );
    }
    println!();

    Ok(())
}

/// Truncates a string to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
