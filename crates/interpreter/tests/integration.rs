// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end interpreter lifecycle.
//!
//! These tests exercise the complete flow from model blob → resolver →
//! tensor allocation → invoke, proving that the runtime crates compose and
//! that the type-state transition works end-to-end.

use interpreter::{Interpreter, InterpreterError, OpResolver};
use model_ir::{Model, ModelBuilder, ModelError, OpCode, OpOptions, SCHEMA_VERSION};
use tensor_arena::{ArenaError, ByteSize, TensorArena};
use tensor_core::{DType, Padding, QuantParams, Shape};

// ── Helpers ────────────────────────────────────────────────────

fn unit() -> Option<QuantParams> {
    Some(QuantParams::new(1.0, 0))
}

/// in[1,4,4,1] → conv(×2) → max_pool 2x2 → reshape[1,4] → fc → softmax[1,2]
fn small_cnn() -> ModelBuilder {
    let mut b = ModelBuilder::new("small_cnn").description("hand-checked pipeline");
    let t_in = b.add_tensor("input", Shape::nhwc(1, 4, 4, 1), DType::U8, unit());
    let t_f = b
        .add_constant("conv/filter", Shape::nhwc(1, 1, 1, 1), DType::U8, unit(), vec![2])
        .unwrap();
    let t_conv = b.add_tensor("conv/out", Shape::nhwc(1, 4, 4, 1), DType::U8, unit());
    let t_pool = b.add_tensor("pool/out", Shape::nhwc(1, 2, 2, 1), DType::U8, unit());
    let t_flat = b.add_tensor("flat", Shape::matrix(1, 4), DType::U8, unit());
    let t_w = b
        .add_constant(
            "fc/weights",
            Shape::matrix(2, 4),
            DType::U8,
            unit(),
            vec![1, 0, 0, 0, 0, 0, 0, 1],
        )
        .unwrap();
    let t_logits = b.add_tensor("logits", Shape::matrix(1, 2), DType::U8, unit());
    let t_probs = b.add_tensor(
        "probs",
        Shape::matrix(1, 2),
        DType::U8,
        Some(QuantParams::new(1.0 / 256.0, 0)),
    );

    b.add_operator(
        OpCode::Conv2d,
        vec![Some(t_in), Some(t_f), None],
        t_conv,
        OpOptions {
            padding: Padding::Valid,
            ..OpOptions::default()
        },
    )
    .add_operator(
        OpCode::MaxPool2d,
        vec![Some(t_conv)],
        t_pool,
        OpOptions {
            filter_h: 2,
            filter_w: 2,
            stride_h: 2,
            stride_w: 2,
            ..OpOptions::default()
        },
    )
    .add_operator(OpCode::Reshape, vec![Some(t_pool)], t_flat, OpOptions::default())
    .add_operator(
        OpCode::FullyConnected,
        vec![Some(t_flat), Some(t_w), None],
        t_logits,
        OpOptions::default(),
    )
    .add_operator(OpCode::Softmax, vec![Some(t_logits)], t_probs, OpOptions::default())
    .set_inputs(vec![t_in])
    .set_outputs(vec![t_probs]);
    b
}

fn load(builder: &ModelBuilder) -> Model {
    Model::from_vec(builder.build().unwrap()).unwrap()
}

fn allocate(
    model: Model,
    arena: ByteSize,
) -> Result<Interpreter<interpreter::Allocated>, InterpreterError> {
    Interpreter::new(model, OpResolver::with_builtins(), TensorArena::new(arena)).allocate_tensors()
}

// ── End-to-end ─────────────────────────────────────────────────

#[test]
fn test_small_cnn_end_to_end() {
    let mut interp = allocate(load(&small_cnn()), ByteSize::from_kb(1)).unwrap();

    let pixels: Vec<u8> = (0..16).collect();
    interp.input_mut(0).unwrap().as_bytes_mut().copy_from_slice(&pixels);
    let metrics = interp.invoke().unwrap();

    assert_eq!(metrics.ops.len(), 5);
    let opcodes: Vec<OpCode> = metrics.ops.iter().map(|m| m.opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            OpCode::Conv2d,
            OpCode::MaxPool2d,
            OpCode::Reshape,
            OpCode::FullyConnected,
            OpCode::Softmax
        ]
    );

    // Pooled ×2 values are [10, 14, 26, 30]; fc keeps the first and last.
    // softmax([10, 30]) saturates to [0, 1.0].
    let out = interp.output(0).unwrap();
    assert_eq!(out.to_i32_vec(), vec![0, 255]);
    assert!((out.dequantize(1).unwrap() - 255.0 / 256.0).abs() < 1e-6);
}

#[test]
fn test_invoke_is_repeatable() {
    let mut interp = allocate(load(&small_cnn()), ByteSize::from_kb(1)).unwrap();
    for round in 0..3u8 {
        let mut input = interp.input_mut(0).unwrap();
        let bytes = input.as_bytes_mut();
        bytes.fill(0);
        // A single bright pixel in the first pooling window favours class 0.
        bytes[0] = 40 + round;
        interp.invoke().unwrap();
        assert_eq!(interp.output(0).unwrap().to_i32_vec(), vec![255, 0]);
    }
}

#[test]
fn test_arena_reuses_memory() {
    let interp = allocate(load(&small_cnn()), ByteSize::from_kb(1)).unwrap();
    let stats = interp.arena_stats();
    assert_eq!(stats.buffers, 6);
    assert!(stats.planned_bytes < stats.naive_bytes);
    let plan = interp.memory_plan();
    plan.arena_plan().validate(plan.requests()).unwrap();
}

// ── Failure paths ──────────────────────────────────────────────

#[test]
fn test_arena_too_small() {
    let err = allocate(load(&small_cnn()), ByteSize::from_bytes(16)).unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::Arena(ArenaError::OutOfMemory { capacity: 16, .. })
    ));
}

#[test]
fn test_zero_arena_always_fails() {
    let err = allocate(load(&small_cnn()), ByteSize::from_bytes(0)).unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::Arena(ArenaError::OutOfMemory { capacity: 0, .. })
    ));
}

#[test]
fn test_unsupported_op_fails_allocation() {
    let mut resolver = OpResolver::with_capacity(10);
    resolver
        .add_conv2d()
        .and_then(|r| r.add_max_pool2d())
        .and_then(|r| r.add_reshape())
        .and_then(|r| r.add_softmax())
        .unwrap();
    let err = Interpreter::new(
        load(&small_cnn()),
        resolver,
        TensorArena::new(ByteSize::from_kb(1)),
    )
    .allocate_tensors()
    .unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::UnsupportedOp {
            index: 3,
            opcode: OpCode::FullyConnected
        }
    ));
}

#[test]
fn test_prepare_rejects_bad_shapes() {
    let mut b = ModelBuilder::new("bad_pool");
    let t_in = b.add_tensor("in", Shape::nhwc(1, 4, 4, 1), DType::U8, unit());
    let t_out = b.add_tensor("out", Shape::nhwc(1, 3, 3, 1), DType::U8, unit());
    b.add_operator(
        OpCode::AveragePool2d,
        vec![Some(t_in)],
        t_out,
        OpOptions {
            filter_h: 2,
            filter_w: 2,
            stride_h: 2,
            stride_w: 2,
            ..OpOptions::default()
        },
    )
    .set_inputs(vec![t_in])
    .set_outputs(vec![t_out]);

    let err = allocate(load(&b), ByteSize::from_kb(1)).unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::Prepare {
            index: 0,
            opcode: OpCode::AveragePool2d,
            ..
        }
    ));
}

#[test]
fn test_schema_version_mismatch_rejected_at_load() {
    let builder = small_cnn().schema_version(SCHEMA_VERSION + 1);
    let err = Model::from_vec(builder.build().unwrap()).unwrap_err();
    assert!(matches!(err, ModelError::SchemaVersionMismatch { .. }));
}
