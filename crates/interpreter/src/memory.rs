// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor lifetimes and arena placement.
//!
//! Every non-constant tensor gets a [`BufferRequest`] spanning the operator
//! indices during which it must stay live:
//!
//! - graph inputs are live from before operator 0;
//! - produced tensors are live from their producer;
//! - graph outputs stay live past the last operator so they can be read
//!   after `invoke`.
//!
//! Tensors that are neither graph inputs nor produced get no region.

use model_ir::{graph::Validated, ModelGraph};
use tensor_arena::{plan, ArenaError, ArenaPlan, BufferRequest, Region};

/// Arena offsets are multiples of this.
pub const ARENA_ALIGNMENT: usize = 16;

/// Arena placement for every activation tensor of a graph.
#[derive(Debug, Clone)]
pub struct MemoryPlan {
    /// Tensor index -> request index.
    slots: Vec<Option<usize>>,
    requests: Vec<BufferRequest>,
    plan: ArenaPlan,
}

impl MemoryPlan {
    /// Computes lifetimes for `graph` and places them in an arena.
    pub fn new(graph: &ModelGraph<Validated>) -> Result<Self, ArenaError> {
        let num_ops = graph.num_operators();
        let last_op = num_ops.saturating_sub(1);
        let mut first: Vec<Option<usize>> = vec![None; graph.tensors.len()];
        let mut last: Vec<usize> = vec![0; graph.tensors.len()];

        for &t in &graph.inputs {
            first[t] = Some(0);
        }
        for (index, op) in graph.iter_operators().enumerate() {
            for t in op.present_inputs() {
                last[t] = last[t].max(index);
            }
            for &t in &op.outputs {
                first[t] = Some(first[t].map_or(index, |f| f.min(index)));
                last[t] = last[t].max(index);
            }
        }
        for &t in &graph.outputs {
            last[t] = last_op;
        }

        let mut slots = vec![None; graph.tensors.len()];
        let mut requests = Vec::new();
        for (t, def) in graph.tensors.iter().enumerate() {
            if def.constant {
                continue;
            }
            let Some(first_use) = first[t] else {
                continue;
            };
            slots[t] = Some(requests.len());
            requests.push(BufferRequest::new(
                def.size_bytes(),
                first_use,
                last[t].max(first_use),
            ));
        }

        let plan = plan(&requests, ARENA_ALIGNMENT)?;
        tracing::debug!(
            buffers = requests.len(),
            planned = plan.total_bytes,
            naive = plan.naive_bytes,
            "memory plan computed"
        );
        Ok(Self {
            slots,
            requests,
            plan,
        })
    }

    /// Region of tensor `t`, if it lives in the arena.
    pub fn region(&self, t: usize) -> Option<Region> {
        let slot = self.slots.get(t).copied().flatten()?;
        self.plan.regions.get(slot).copied()
    }

    /// Lifetime request of tensor `t`, if it lives in the arena.
    pub fn request(&self, t: usize) -> Option<&BufferRequest> {
        let slot = self.slots.get(t).copied().flatten()?;
        self.requests.get(slot)
    }

    pub fn arena_plan(&self) -> &ArenaPlan {
        &self.plan
    }

    pub fn requests(&self) -> &[BufferRequest] {
        &self.requests
    }

    /// Bytes the arena must hold.
    pub fn required_bytes(&self) -> usize {
        self.plan.total_bytes
    }
}
