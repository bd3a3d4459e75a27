// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Image sources: raw pixel dumps and encoded files.
//!
//! Raw files are read byte-for-byte and must be exactly
//! `width × height × channels` bytes. Encoded files are decoded with the
//! `image` crate and converted to grayscale or RGB.

use crate::PipelineError;
use flash_storage::FlashStorage;
use image::{imageops::FilterType, DynamicImage};
use std::path::Path;
use tensor_core::Shape;

/// Pixel geometry of every image in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageSpec {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            channels: 1,
        }
    }
}

impl ImageSpec {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Size of one image buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// The model input shape this spec feeds: `[1, height, width, channels]`.
    pub fn input_shape(&self) -> Shape {
        Shape::nhwc(1, self.height, self.width, self.channels)
    }
}

/// How a file's bytes become pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Headerless `width × height × channels` bytes.
    Raw,
    /// PNG, JPEG, BMP or PNM.
    Encoded,
}

impl ImageSource {
    /// Picks the source from the file extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "bin" | "raw" => Some(Self::Raw),
            "png" | "jpg" | "jpeg" | "bmp" | "pgm" | "ppm" | "pnm" => Some(Self::Encoded),
            _ => None,
        }
    }
}

/// Fills `buf` from the image at virtual `path`.
pub fn load_image(
    storage: &FlashStorage,
    path: &str,
    spec: &ImageSpec,
    buf: &mut [u8],
) -> Result<(), PipelineError> {
    match ImageSource::from_name(path) {
        Some(ImageSource::Raw) => read_raw(storage, path, spec, buf),
        Some(ImageSource::Encoded) => {
            let bytes = storage.read(path)?;
            decode_into(&bytes, path, spec, buf)
        }
        None => Err(PipelineError::UnsupportedFormat { path: path.into() }),
    }
}

/// Reads a raw image, rejecting any file that is not exactly one buffer.
pub fn read_raw(
    storage: &FlashStorage,
    path: &str,
    spec: &ImageSpec,
    buf: &mut [u8],
) -> Result<(), PipelineError> {
    let expected = spec.byte_len();
    check_len(path, expected, buf.len())?;
    let mut file = storage.open(path)?;
    if file.len() != expected as u64 {
        return Err(PipelineError::ImageSize {
            path: path.into(),
            expected,
            actual: file.len() as usize,
        });
    }
    let read = file.read_fully(buf)?;
    check_len(path, expected, read)?;
    tracing::debug!(path, bytes = read, "raw image read");
    Ok(())
}

/// Decodes an encoded image into `buf`, converting to the channel count in `spec`.
pub fn decode_into(
    bytes: &[u8],
    path: &str,
    spec: &ImageSpec,
    buf: &mut [u8],
) -> Result<(), PipelineError> {
    check_len(path, spec.byte_len(), buf.len())?;
    let img = image::load_from_memory(bytes).map_err(|source| PipelineError::Decode {
        path: path.into(),
        source,
    })?;
    check_dimensions(path, spec, &img)?;
    let pixels = to_channels(img, spec.channels)?;
    check_len(path, spec.byte_len(), pixels.len())?;
    buf.copy_from_slice(&pixels);
    tracing::debug!(path, "image decoded");
    Ok(())
}

/// Decodes `input`, optionally resizes it to `spec`, and writes raw bytes
/// to `output`. Returns the number of bytes written.
pub fn convert_to_raw(
    input: &Path,
    output: &Path,
    spec: &ImageSpec,
    resize: bool,
) -> Result<usize, PipelineError> {
    let display = input.display().to_string();
    let mut img = image::open(input).map_err(|source| PipelineError::Decode {
        path: display.clone(),
        source,
    })?;
    if resize {
        img = img.resize_exact(spec.width as u32, spec.height as u32, FilterType::Triangle);
    } else {
        check_dimensions(&display, spec, &img)?;
    }
    let pixels = to_channels(img, spec.channels)?;
    std::fs::write(output, &pixels).map_err(|source| PipelineError::Io {
        path: output.display().to_string(),
        source,
    })?;
    tracing::info!(input = %input.display(), output = %output.display(), bytes = pixels.len(), "converted");
    Ok(pixels.len())
}

fn to_channels(img: DynamicImage, channels: usize) -> Result<Vec<u8>, PipelineError> {
    match channels {
        1 => Ok(img.into_luma8().into_raw()),
        3 => Ok(img.into_rgb8().into_raw()),
        n => Err(PipelineError::UnsupportedChannels(n)),
    }
}

fn check_dimensions(path: &str, spec: &ImageSpec, img: &DynamicImage) -> Result<(), PipelineError> {
    let (w, h) = (img.width(), img.height());
    if w as usize != spec.width || h as usize != spec.height {
        return Err(PipelineError::ImageDimensions {
            path: path.into(),
            expected_w: spec.width as u32,
            expected_h: spec.height as u32,
            found_w: w,
            found_h: h,
        });
    }
    Ok(())
}

fn check_len(path: &str, expected: usize, actual: usize) -> Result<(), PipelineError> {
    if actual != expected {
        return Err(PipelineError::ImageSize {
            path: path.into(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flash_storage::MountConfig;
    use image::{GrayImage, Luma};

    fn storage(dir: &tempfile::TempDir) -> FlashStorage {
        FlashStorage::mount(MountConfig::with_root(dir.path())).unwrap()
    }

    fn gradient_png(w: u32, h: u32) -> Vec<u8> {
        let img = GrayImage::from_fn(w, h, |x, y| Luma([(x + y * w) as u8]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_source_from_name() {
        assert_eq!(ImageSource::from_name("a.bin"), Some(ImageSource::Raw));
        assert_eq!(ImageSource::from_name("a.JPG"), Some(ImageSource::Encoded));
        assert_eq!(ImageSource::from_name("a.pgm"), Some(ImageSource::Encoded));
        assert_eq!(ImageSource::from_name("a.txt"), None);
        assert_eq!(ImageSource::from_name("noext"), None);
    }

    #[test]
    fn test_read_raw_exact_length() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ImageSpec::new(4, 4, 1);
        std::fs::write(dir.path().join("ok.bin"), [9u8; 16]).unwrap();
        std::fs::write(dir.path().join("short.bin"), [9u8; 15]).unwrap();
        std::fs::write(dir.path().join("long.bin"), [9u8; 17]).unwrap();
        let s = storage(&dir);

        let mut buf = vec![0u8; spec.byte_len()];
        read_raw(&s, "/spiffs/ok.bin", &spec, &mut buf).unwrap();
        assert_eq!(buf, vec![9u8; 16]);
        for name in ["/spiffs/short.bin", "/spiffs/long.bin"] {
            assert!(matches!(
                read_raw(&s, name, &spec, &mut buf),
                Err(PipelineError::ImageSize { expected: 16, .. })
            ));
        }
    }

    #[test]
    fn test_decode_png() {
        let spec = ImageSpec::new(8, 4, 1);
        let mut buf = vec![0u8; spec.byte_len()];
        decode_into(&gradient_png(8, 4), "g.png", &spec, &mut buf).unwrap();
        assert_eq!(buf, (0..32).collect::<Vec<u8>>());

        let rgb = ImageSpec::new(8, 4, 3);
        let mut buf = vec![0u8; rgb.byte_len()];
        decode_into(&gradient_png(8, 4), "g.png", &rgb, &mut buf).unwrap();
        assert_eq!(&buf[..6], &[0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_decode_wrong_dimensions() {
        let spec = ImageSpec::new(4, 4, 1);
        let mut buf = vec![0u8; spec.byte_len()];
        assert!(matches!(
            decode_into(&gradient_png(8, 4), "g.png", &spec, &mut buf),
            Err(PipelineError::ImageDimensions { found_w: 8, .. })
        ));
        assert!(matches!(
            decode_into(b"not an image", "g.png", &spec, &mut buf),
            Err(PipelineError::Decode { .. })
        ));
    }

    #[test]
    fn test_convert_to_raw_with_resize() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.bin");
        std::fs::write(&input, gradient_png(16, 16)).unwrap();

        let spec = ImageSpec::new(8, 8, 1);
        assert!(matches!(
            convert_to_raw(&input, &output, &spec, false),
            Err(PipelineError::ImageDimensions { .. })
        ));
        assert_eq!(convert_to_raw(&input, &output, &spec, true).unwrap(), 64);
        assert_eq!(std::fs::read(&output).unwrap().len(), 64);
    }
}
