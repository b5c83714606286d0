//! Common test utilities and helpers for the image batch tools tests
//!
//! Synthetic image generators and an in-memory stand-in for the remote service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cloud_transform::{CloudError, CloudResult, RemoteTransform, TransformParams, TransformedAsset};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Test image generators
pub mod images {
    use super::*;

    /// Smooth RGBA gradient with varying alpha, written with the cheapest PNG settings
    /// so a best-compression re-encode always shrinks it.
    pub fn loose_png_rgba(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) % 256) as u8,
                (x % 200 + 55) as u8,
            ])
        });
        encode_png(DynamicImage::ImageRgba8(image), CompressionType::Fast, FilterType::NoFilter)
    }

    /// Opaque RGB gradient PNG, also loosely compressed.
    pub fn loose_png_rgb(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
        });
        encode_png(DynamicImage::ImageRgb8(image), CompressionType::Fast, FilterType::NoFilter)
    }

    pub fn encode_png(image: DynamicImage, compression: CompressionType, filter: FilterType) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_with_encoder(PngEncoder::new_with_quality(&mut buffer, compression, filter))
            .expect("encode test png");
        buffer
    }

    /// Bytes that no decoder accepts.
    pub fn corrupt() -> Vec<u8> {
        b"definitely not an image".to_vec()
    }
}

/// Call recorded by [`MockRemote`].
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteCall {
    Transform { bytes: usize, transformation: String },
    Fetch(String),
    Delete(Vec<String>),
    List,
}

/// In-memory remote service.
///
/// Every transform creates `res_<n>`; fetch returns the configured bytes. Failures can
/// be queued per operation.
#[derive(Default)]
pub struct MockRemote {
    pub calls: Mutex<Vec<RemoteCall>>,
    pub stored: Mutex<Vec<String>>,
    pub next_id: AtomicUsize,
    pub fetch_body: Vec<u8>,
    pub format: String,
    pub transform_failures: Mutex<VecDeque<bool>>,
    pub fetch_failures: Mutex<VecDeque<bool>>,
    pub fail_delete: bool,
    pub fail_list: bool,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            fetch_body: b"remote-bytes".to_vec(),
            format: "png".into(),
            ..Default::default()
        }
    }

    pub fn with_stored(self, ids: &[&str]) -> Self {
        *self.stored.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Queue transform outcomes; `true` fails that call.
    pub fn failing_transforms(self, pattern: &[bool]) -> Self {
        *self.transform_failures.lock().unwrap() = pattern.iter().copied().collect();
        self
    }

    pub fn failing_fetches(self, pattern: &[bool]) -> Self {
        *self.fetch_failures.lock().unwrap() = pattern.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Delete(ids) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn transformations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Transform { transformation, .. } => Some(transformation),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn simulated_failure(operation: &'static str) -> CloudError {
        CloudError::Status {
            operation,
            status: 500,
            body: "simulated".into(),
        }
    }
}

impl RemoteTransform for MockRemote {
    fn transform(&self, payload: &[u8], params: &TransformParams) -> CloudResult<TransformedAsset> {
        self.record(RemoteCall::Transform {
            bytes: payload.len(),
            transformation: params.to_transformation_string(),
        });
        if self.transform_failures.lock().unwrap().pop_front().unwrap_or(false) {
            return Err(Self::simulated_failure("upload"));
        }
        let public_id = format!("res_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.stored.lock().unwrap().push(public_id.clone());
        Ok(TransformedAsset {
            url: format!("https://mock.invalid/{public_id}.{}", self.format),
            public_id,
            format: self.format.clone(),
        })
    }

    fn fetch(&self, url: &str) -> CloudResult<Vec<u8>> {
        self.record(RemoteCall::Fetch(url.to_string()));
        if self.fetch_failures.lock().unwrap().pop_front().unwrap_or(false) {
            return Err(Self::simulated_failure("fetch"));
        }
        Ok(self.fetch_body.clone())
    }

    fn delete_resources(&self, ids: &[String]) -> CloudResult<()> {
        self.record(RemoteCall::Delete(ids.to_vec()));
        if self.fail_delete {
            return Err(Self::simulated_failure("delete"));
        }
        self.stored.lock().unwrap().retain(|id| !ids.contains(id));
        Ok(())
    }

    fn list_resources(&self) -> CloudResult<Vec<String>> {
        self.record(RemoteCall::List);
        if self.fail_list {
            return Err(Self::simulated_failure("list"));
        }
        Ok(self.stored.lock().unwrap().clone())
    }
}
