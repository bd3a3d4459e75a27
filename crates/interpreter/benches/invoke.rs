// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for tensor allocation and invoke.

use criterion::{criterion_group, criterion_main, Criterion};
use interpreter::{Interpreter, OpResolver};
use model_ir::{Model, ModelBuilder, OpCode, OpOptions};
use std::hint::black_box;
use tensor_arena::{ByteSize, TensorArena};
use tensor_core::{DType, QuantParams, Shape};

/// 32x32 grayscale → conv 3x3 (8) → depthwise 3x3 → avg pool → fc(10) → softmax.
fn bench_model() -> Model {
    let q = Some(QuantParams::new(0.05, 0));
    let mut b = ModelBuilder::new("bench");
    let t_in = b.add_tensor("in", Shape::nhwc(1, 32, 32, 1), DType::I8, q);
    let t_f1 = b
        .add_constant("f1", Shape::nhwc(8, 3, 3, 1), DType::I8, q, vec![3; 72])
        .unwrap();
    let t_c1 = b.add_tensor("c1", Shape::nhwc(1, 32, 32, 8), DType::I8, q);
    let t_f2 = b
        .add_constant("f2", Shape::nhwc(1, 3, 3, 8), DType::I8, q, vec![2; 72])
        .unwrap();
    let t_c2 = b.add_tensor("c2", Shape::nhwc(1, 32, 32, 8), DType::I8, q);
    let t_p = b.add_tensor("p", Shape::nhwc(1, 8, 8, 8), DType::I8, q);
    let t_w = b
        .add_constant("w", Shape::matrix(10, 512), DType::I8, q, vec![1; 5120])
        .unwrap();
    let t_l = b.add_tensor("logits", Shape::matrix(1, 10), DType::I8, q);
    let t_s = b.add_tensor(
        "probs",
        Shape::matrix(1, 10),
        DType::I8,
        Some(QuantParams::new(1.0 / 256.0, -128)),
    );
    b.add_operator(OpCode::Conv2d, vec![Some(t_in), Some(t_f1), None], t_c1, OpOptions::default())
        .add_operator(
            OpCode::DepthwiseConv2d,
            vec![Some(t_c1), Some(t_f2), None],
            t_c2,
            OpOptions::default(),
        )
        .add_operator(
            OpCode::AveragePool2d,
            vec![Some(t_c2)],
            t_p,
            OpOptions {
                filter_h: 4,
                filter_w: 4,
                stride_h: 4,
                stride_w: 4,
                ..OpOptions::default()
            },
        )
        .add_operator(
            OpCode::FullyConnected,
            vec![Some(t_p), Some(t_w), None],
            t_l,
            OpOptions::default(),
        )
        .add_operator(OpCode::Softmax, vec![Some(t_l)], t_s, OpOptions::default())
        .set_inputs(vec![t_in])
        .set_outputs(vec![t_s]);
    Model::from_vec(b.build().expect("build")).expect("load")
}

fn bench_allocate(c: &mut Criterion) {
    c.bench_function("allocate_tensors", |b| {
        b.iter(|| {
            Interpreter::new(
                bench_model(),
                OpResolver::with_builtins(),
                TensorArena::new(ByteSize::from_kb(64)),
            )
            .allocate_tensors()
            .expect("allocate")
        })
    });
}

fn bench_invoke(c: &mut Criterion) {
    let mut interp = Interpreter::new(
        bench_model(),
        OpResolver::with_builtins(),
        TensorArena::new(ByteSize::from_kb(64)),
    )
    .allocate_tensors()
    .expect("allocate");
    interp
        .input_mut(0)
        .expect("input")
        .as_bytes_mut()
        .iter_mut()
        .enumerate()
        .for_each(|(i, b)| *b = (i % 31) as u8);

    c.bench_function("invoke_32x32", |b| {
        b.iter(|| black_box(interp.invoke().expect("invoke")))
    });
}

criterion_group!(benches, bench_allocate, bench_invoke);
criterion_main!(benches);
