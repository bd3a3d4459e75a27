// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: boot and batch processing over a temp partition.

use flash_storage::{MountConfig, StorageError};
use image_pipeline::demo::{classifier_model, classifier_model_with_input};
use image_pipeline::{boot, ImageOutcome, ImageSpec, PipelineError, RunnerConfig};
use model_ir::{ModelBuilder, ModelError, OpCode, OpOptions, SCHEMA_VERSION};
use tempfile::TempDir;
use tensor_core::{DType, QuantParams, Shape};

const CLASSES: usize = 4;

fn spec() -> ImageSpec {
    ImageSpec::new(28, 28, 1)
}

/// Lays out `<tmp>/model.fim` and `<tmp>/flash/images/<files>`.
fn setup(model: Vec<u8>, files: &[(&str, Vec<u8>)]) -> (TempDir, RunnerConfig) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("flash");
    let images = root.join("images");
    std::fs::create_dir_all(&images).unwrap();
    for (name, bytes) in files {
        std::fs::write(images.join(name), bytes).unwrap();
    }
    let model_path = dir.path().join("model.fim");
    std::fs::write(&model_path, model).unwrap();

    let config = RunnerConfig {
        model_path,
        extensions: vec!["bin".into(), "png".into()],
        image: spec(),
        storage: MountConfig::with_root(&root),
        ..RunnerConfig::default()
    };
    (dir, config)
}

fn raw_image(seed: u8) -> Vec<u8> {
    (0..spec().byte_len())
        .map(|i| (i as u8).wrapping_mul(seed))
        .collect()
}

fn png_image(w: u32, h: u32) -> Vec<u8> {
    let img = image::GrayImage::from_fn(w, h, |x, y| image::Luma([((x * 9) ^ (y * 5)) as u8]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// ── Batch processing ───────────────────────────────────────────

#[test]
fn test_processes_matching_files_and_skips_bad_ones() {
    let (_dir, config) = setup(
        classifier_model(&spec(), CLASSES).unwrap(),
        &[
            ("a.bin", raw_image(3)),
            ("b.bin", vec![0u8; 100]),
            ("c.txt", b"not an image".to_vec()),
            ("d.png", png_image(28, 28)),
            ("e.png", png_image(32, 32)),
        ],
    );
    let mut pipeline = boot(&config).unwrap();
    let report = pipeline.process_images().unwrap();

    let names: Vec<&str> = report.images.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a.bin", "b.bin", "d.png", "e.png"]);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.skipped(), 2);
    assert!(report.mean_latency().is_some());
    for result in report.results() {
        assert!(result.top_class < CLASSES);
        assert!((0.0..=1.0).contains(&result.score));
    }
    match &report.images[1].outcome {
        ImageOutcome::Skipped { reason } => assert!(reason.contains("instead of 784")),
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(pipeline.storage().open_files(), 0);
}

#[test]
fn test_empty_directory_gives_empty_report() {
    let (_dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let report = boot(&config).unwrap().process_images().unwrap();
    assert_eq!(report.images.len(), 0);
    assert_eq!(report.mean_latency(), None);
}

#[test]
fn test_missing_image_dir_fails_batch() {
    let (_dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let config = RunnerConfig {
        image_dir: "/spiffs/nowhere".into(),
        ..config
    };
    let err = boot(&config).unwrap().process_images().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Storage(StorageError::NotFound { .. })
    ));
}

#[test]
fn test_i8_input_matches_u8_input() {
    let pixels = raw_image(7);
    let (_d1, u8_config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let (_d2, i8_config) = setup(
        classifier_model_with_input(&spec(), CLASSES, DType::I8).unwrap(),
        &[],
    );

    let u8_result = boot(&u8_config).unwrap().run_inference(&pixels).unwrap();
    let mut i8_pipeline = boot(&i8_config).unwrap();
    let i8_result = i8_pipeline.run_inference(&pixels).unwrap();

    assert_eq!(u8_result.first_output, i8_result.first_output);
    assert_eq!(u8_result.top_class, i8_result.top_class);
    let input = i8_pipeline.interpreter().input(0).unwrap();
    assert_eq!(input.get_i32(0), i32::from(pixels[0]) - 128);
}

#[test]
fn test_run_inference_rejects_wrong_length() {
    let (_dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let mut pipeline = boot(&config).unwrap();
    assert!(matches!(
        pipeline.run_inference(&[0u8; 10]),
        Err(PipelineError::ImageSize {
            expected: 784,
            actual: 10,
            ..
        })
    ));
}

// ── Boot failures ──────────────────────────────────────────────

#[test]
fn test_schema_mismatch_aborts_boot() {
    let q = Some(QuantParams::new(1.0, 0));
    let mut b = ModelBuilder::new("future").schema_version(SCHEMA_VERSION + 1);
    let t_in = b.add_tensor("in", spec().input_shape(), DType::U8, q);
    let t_out = b.add_tensor("out", Shape::matrix(1, 784), DType::U8, q);
    b.add_operator(OpCode::Reshape, vec![Some(t_in)], t_out, OpOptions::default())
        .set_inputs(vec![t_in])
        .set_outputs(vec![t_out]);

    let (_dir, config) = setup(b.build().unwrap(), &[]);
    assert!(matches!(
        boot(&config),
        Err(PipelineError::Model(ModelError::SchemaVersionMismatch { .. }))
    ));
}

#[test]
fn test_zero_arena_aborts_boot() {
    let (_dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let config = RunnerConfig {
        arena_size: "0".into(),
        ..config
    };
    assert!(matches!(boot(&config), Err(PipelineError::Interpreter(_))));
}

#[test]
fn test_image_spec_must_match_model_input() {
    let (_dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let config = RunnerConfig {
        image: ImageSpec::new(32, 32, 1),
        ..config
    };
    assert!(matches!(boot(&config), Err(PipelineError::ModelMismatch(_))));
}

#[test]
fn test_unsupported_channel_count_aborts_boot() {
    let four = ImageSpec::new(28, 28, 4);
    let (_dir, config) = setup(classifier_model(&four, CLASSES).unwrap(), &[]);
    let config = RunnerConfig {
        image: four,
        ..config
    };
    assert!(matches!(
        boot(&config),
        Err(PipelineError::UnsupportedChannels(4))
    ));
}

#[test]
fn test_unmountable_partition_aborts_boot() {
    let (dir, config) = setup(classifier_model(&spec(), CLASSES).unwrap(), &[]);
    let config = RunnerConfig {
        storage: MountConfig {
            format_if_mount_failed: false,
            ..MountConfig::with_root(dir.path().join("absent"))
        },
        ..config
    };
    assert!(matches!(
        boot(&config),
        Err(PipelineError::Storage(StorageError::MountFailed { .. }))
    ));
}
