//! Asynchronous image loading for `bindAndCreateTexture`
//!
//! Requests are fetched and decoded on the tokio runtime. Finished loads
//! queue up on a channel that the render thread drains between frames,
//! so GL is only ever touched from the render thread.

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::fetch::{FetchError, Location, fetch_bytes};
use crate::graphics::TextureImage;

/// An image load started by the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    /// Texture handle the pixels belong to
    pub handle: u32,
    /// Unit the texture was created on
    pub unit: u32,
    /// Source string as passed by the module
    pub source: String,
}

/// A finished load, successful or not
#[derive(Debug)]
pub struct TextureLoad {
    pub request: TextureRequest,
    pub result: Result<TextureImage, TextureLoadError>,
}

#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("decode task failed: {0}")]
    Task(String),
}

/// Fire-and-forget texture loader
pub struct TextureLoader {
    runtime: Handle,
    base: Location,
    tx: UnboundedSender<TextureLoad>,
    rx: UnboundedReceiver<TextureLoad>,
    in_flight: usize,
}

impl TextureLoader {
    /// Create a loader resolving relative sources against `base`
    pub fn new(runtime: Handle, base: Location) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            base,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn base(&self) -> &Location {
        &self.base
    }

    /// Loads requested but not yet drained
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start loading; never blocks
    pub fn request(&mut self, request: TextureRequest) {
        let location = self.base.join(&request.source);
        let tx = self.tx.clone();
        self.in_flight += 1;

        tracing::debug!(
            "Loading texture {} for handle {} from {}",
            request.source,
            request.handle,
            location
        );

        self.runtime.spawn(async move {
            let result = load_image(&location).await;
            // The receiver only goes away with the loader itself
            let _ = tx.send(TextureLoad { request, result });
        });
    }

    /// Take every load that has finished, without waiting
    pub fn drain(&mut self) -> Vec<TextureLoad> {
        let mut finished = Vec::new();
        while let Ok(load) = self.rx.try_recv() {
            finished.push(load);
        }
        self.in_flight = self.in_flight.saturating_sub(finished.len());
        finished
    }

    /// Wait for the next finished load
    pub async fn next_finished(&mut self) -> Option<TextureLoad> {
        let load = self.rx.recv().await;
        if load.is_some() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        load
    }
}

async fn load_image(location: &Location) -> Result<TextureImage, TextureLoadError> {
    let bytes = fetch_bytes(location).await?;
    tokio::task::spawn_blocking(move || decode_rgba(&bytes))
        .await
        .map_err(|e| TextureLoadError::Task(e.to_string()))?
}

/// Decode any supported image format into RGBA8
pub fn decode_rgba(bytes: &[u8]) -> Result<TextureImage, TextureLoadError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(TextureImage {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::test_utils::{test_runtime, write_png};

    #[test]
    fn test_request_does_not_block_and_completes_later() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("sky.png"), 4, 2);

        let runtime = test_runtime();
        let mut loader =
            TextureLoader::new(runtime.handle().clone(), Location::File(dir.path().to_path_buf()));

        loader.request(TextureRequest {
            handle: 3,
            unit: 2,
            source: "sky.png".to_string(),
        });
        assert_eq!(loader.in_flight(), 1);

        let load = runtime.block_on(loader.next_finished()).unwrap();
        assert_eq!(load.request.handle, 3);
        assert_eq!(load.request.unit, 2);
        let image = load.result.unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.pixels.len(), 4 * 2 * 4);
        assert_eq!(&image.pixels[..4], &[255, 0, 128, 255]);
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn test_missing_file_reports_fetch_error() {
        let runtime = test_runtime();
        let mut loader =
            TextureLoader::new(runtime.handle().clone(), Location::File(PathBuf::from("/nope")));

        loader.request(TextureRequest {
            handle: 0,
            unit: 0,
            source: "missing.png".to_string(),
        });

        let load = runtime.block_on(loader.next_finished()).unwrap();
        assert!(matches!(load.result, Err(TextureLoadError::Fetch(_))));
    }

    #[test]
    fn test_garbage_bytes_report_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();

        let runtime = test_runtime();
        let mut loader =
            TextureLoader::new(runtime.handle().clone(), Location::File(dir.path().to_path_buf()));
        loader.request(TextureRequest {
            handle: 1,
            unit: 0,
            source: "bad.png".to_string(),
        });

        let load = runtime.block_on(loader.next_finished()).unwrap();
        assert!(matches!(load.result, Err(TextureLoadError::Decode(_))));
    }

    #[test]
    fn test_drain_is_empty_without_requests() {
        let runtime = test_runtime();
        let mut loader =
            TextureLoader::new(runtime.handle().clone(), Location::File(PathBuf::from(".")));
        assert!(loader.drain().is_empty());
    }
}
