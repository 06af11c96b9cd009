//! Camera stream handling and still capture.
//!
//! A [`CameraDevice`] hands out [`VideoStream`]s; the [`CameraController`]
//! owns at most one stream at a time and walks the
//! `Idle -> Streaming -> Captured -> Idle` cycle, with `Error` standing in
//! for `Streaming` when no stream could be opened.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front (selfie) camera.
    User,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// What to ask a device for. Dimensions are a preference, not a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Requested facing.
    pub facing: FacingMode,
    /// Preferred width in pixels.
    pub ideal_width: u32,
    /// Preferred height in pixels.
    pub ideal_height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// A live video stream.
pub trait VideoStream: Send + std::fmt::Debug {
    /// Native resolution of the stream as `(width, height)`.
    fn resolution(&self) -> (u32, u32);

    /// The current frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream has ended or the frame is unavailable.
    fn frame(&mut self) -> Result<RgbImage>;

    /// Release the underlying tracks. Safe to call more than once.
    fn stop(&mut self);
}

/// A source of video streams.
#[async_trait]
pub trait CameraDevice: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Open a stream, honoring `constraints` as far as the device can.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] when access is denied or no
    /// device is present.
    async fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>>;
}

/// Camera lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CameraState {
    /// No stream, nothing captured.
    #[default]
    Idle,
    /// A stream is open.
    Streaming,
    /// A still was taken and the stream released.
    Captured,
    /// The last attempt to open a stream failed.
    Error(String),
}

impl std::fmt::Display for CameraState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Streaming => write!(f, "streaming"),
            Self::Captured => write!(f, "captured"),
            Self::Error(_) => write!(f, "in error"),
        }
    }
}

/// An encoded still.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Encode `image` as a JPEG data URI at `quality` (1-100).
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_data_uri(image: &RgbImage, quality: u8) -> Result<String> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
        encoder.encode_image(image)?;
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/jpeg;base64,{encoded}"))
}

/// Drives one camera device.
#[derive(Debug)]
pub struct CameraController {
    device: Box<dyn CameraDevice>,
    constraints: StreamConstraints,
    jpeg_quality: u8,
    stream: Option<Box<dyn VideoStream>>,
    state: CameraState,
}

impl CameraController {
    /// Create a controller for `device`.
    #[must_use]
    pub fn new(
        device: Box<dyn CameraDevice>,
        constraints: StreamConstraints,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            device,
            constraints,
            jpeg_quality,
            stream: None,
            state: CameraState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Whether a stream is open.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Open a stream, releasing any previous one first.
    ///
    /// On failure the controller moves to [`CameraState::Error`] and the
    /// error is returned for the caller to display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] if no stream could be opened.
    pub async fn start_camera(&mut self) -> Result<()> {
        self.release_stream();

        match self.device.open(&self.constraints).await {
            Ok(stream) => {
                let (width, height) = stream.resolution();
                debug!(
                    device = self.device.name(),
                    width,
                    height,
                    facing = %self.constraints.facing,
                    "Camera stream started"
                );
                self.stream = Some(stream);
                self.state = CameraState::Streaming;
                Ok(())
            }
            Err(e) => {
                let err = if e.is_camera_unavailable() {
                    e
                } else {
                    Error::camera_unavailable(e.to_string())
                };
                warn!(device = self.device.name(), error = %err, "Could not open camera");
                self.state = CameraState::Error(err.to_string());
                Err(err)
            }
        }
    }

    /// Current frame of the open stream, for live preview.
    ///
    /// # Errors
    ///
    /// Returns an error if no stream is open.
    pub fn live_frame(&mut self) -> Result<RgbImage> {
        let state = self.state.to_string();
        let stream = self.stream.as_mut().ok_or(Error::CameraState {
            state,
            operation: "show a live frame",
        })?;
        stream.frame()
    }

    /// Take a still from the open stream and release the stream.
    ///
    /// The frame is drawn onto a raster of the stream's native resolution
    /// and encoded as JPEG.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera is not streaming or encoding fails.
    pub fn capture_photo(&mut self) -> Result<CapturedImage> {
        if self.state != CameraState::Streaming {
            return Err(Error::CameraState {
                state: self.state.to_string(),
                operation: "capture",
            });
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::internal("streaming without a stream"))?;

        let (width, height) = stream.resolution();
        let frame = stream.frame()?;

        let mut raster = RgbImage::new(width, height);
        image::imageops::replace(&mut raster, &frame, 0, 0);
        let data_uri = encode_data_uri(&raster, self.jpeg_quality)?;

        self.release_stream();
        self.state = CameraState::Captured;
        debug!(width, height, bytes = data_uri.len(), "Captured still");

        Ok(CapturedImage {
            data_uri,
            width,
            height,
        })
    }

    /// Release the stream and go idle. Does nothing extra when already idle.
    pub fn stop_camera(&mut self) {
        self.release_stream();
        self.state = CameraState::Idle;
    }

    /// Drop the captured still and open the stream again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraUnavailable`] if the stream cannot be reopened.
    pub async fn retake(&mut self) -> Result<()> {
        self.state = CameraState::Idle;
        self.start_camera().await
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!(device = self.device.name(), "Camera stream released");
        }
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.release_stream();
    }
}

/// A camera backed by an image file.
///
/// Each stream repeats the file's picture, scaled down to fit the preferred
/// resolution when larger.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    /// Create a device reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing image path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    fn name(&self) -> &'static str {
        "still-image"
    }

    async fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::camera_unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            Error::camera_unavailable(format!("cannot decode {}: {e}", self.path.display()))
        })?;

        let fits = decoded.width() <= constraints.ideal_width
            && decoded.height() <= constraints.ideal_height;
        let picture = if fits {
            decoded.to_rgb8()
        } else {
            decoded
                .resize(constraints.ideal_width, constraints.ideal_height, FilterType::Triangle)
                .to_rgb8()
        };

        Ok(Box::new(StillImageStream {
            picture,
            stopped: false,
        }))
    }
}

#[derive(Debug)]
struct StillImageStream {
    picture: RgbImage,
    stopped: bool,
}

impl VideoStream for StillImageStream {
    fn resolution(&self) -> (u32, u32) {
        self.picture.dimensions()
    }

    fn frame(&mut self) -> Result<RgbImage> {
        if self.stopped {
            return Err(Error::camera_unavailable("stream has ended"));
        }
        Ok(self.picture.clone())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Device producing solid frames; counts open and stopped streams.
    #[derive(Debug, Default)]
    struct FakeDevice {
        deny: bool,
        opened: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    #[derive(Debug)]
    struct FakeStream {
        frame: RgbImage,
        stopped: Arc<AtomicUsize>,
    }

    impl VideoStream for FakeStream {
        fn resolution(&self) -> (u32, u32) {
            self.frame.dimensions()
        }

        fn frame(&mut self) -> Result<RgbImage> {
            Ok(self.frame.clone())
        }

        fn stop(&mut self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CameraDevice for FakeDevice {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn open(&self, _constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>> {
            if self.deny {
                return Err(Error::camera_unavailable("permission denied"));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                frame: RgbImage::from_pixel(64, 48, image::Rgb([200, 30, 30])),
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    fn controller(device: FakeDevice) -> CameraController {
        CameraController::new(Box::new(device), StreamConstraints::default(), 90)
    }

    #[tokio::test]
    async fn test_start_and_capture() {
        let mut camera = controller(FakeDevice::default());
        assert_eq!(camera.state(), &CameraState::Idle);

        camera.start_camera().await.unwrap();
        assert_eq!(camera.state(), &CameraState::Streaming);

        let still = camera.capture_photo().unwrap();
        assert!(still.data_uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!((still.width, still.height), (64, 48));
        assert_eq!(camera.state(), &CameraState::Captured);
        assert!(!camera.is_streaming());
    }

    #[tokio::test]
    async fn test_denied_camera_enters_error_state() {
        let mut camera = controller(FakeDevice {
            deny: true,
            ..FakeDevice::default()
        });

        let err = camera.start_camera().await.unwrap_err();
        assert!(err.is_camera_unavailable());
        assert!(matches!(camera.state(), CameraState::Error(msg) if msg.contains("permission denied")));
        assert!(!camera.is_streaming());
    }

    #[tokio::test]
    async fn test_capture_requires_stream() {
        let mut camera = controller(FakeDevice::default());
        let err = camera.capture_photo().unwrap_err();
        assert!(err.to_string().contains("cannot capture"));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let device = FakeDevice::default();
        let stopped = Arc::clone(&device.stopped);
        let mut camera = controller(device);

        camera.stop_camera();
        camera.start_camera().await.unwrap();
        camera.stop_camera();
        camera.stop_camera();

        assert_eq!(stopped.load(Ordering::SeqCst), 1);
        assert_eq!(camera.state(), &CameraState::Idle);
    }

    #[tokio::test]
    async fn test_restart_releases_previous_stream() {
        let device = FakeDevice::default();
        let opened = Arc::clone(&device.opened);
        let stopped = Arc::clone(&device.stopped);
        let mut camera = controller(device);

        camera.start_camera().await.unwrap();
        camera.start_camera().await.unwrap();

        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retake_reopens_stream() {
        let mut camera = controller(FakeDevice::default());
        camera.start_camera().await.unwrap();
        camera.capture_photo().unwrap();

        camera.retake().await.unwrap();
        assert_eq!(camera.state(), &CameraState::Streaming);
        assert!(camera.live_frame().is_ok());
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let device = FakeDevice::default();
        let stopped = Arc::clone(&device.stopped);
        let mut camera = controller(device);
        camera.start_camera().await.unwrap();

        drop(camera);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_encode_data_uri_roundtrips_dimensions() {
        let image = RgbImage::from_pixel(10, 7, image::Rgb([1, 2, 3]));
        let uri = encode_data_uri(&image, 90).unwrap();

        let payload = uri.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 7));
    }

    #[tokio::test]
    async fn test_still_image_camera_missing_file() {
        let device = StillImageCamera::new("/nonexistent/photo.png");
        let err = device.open(&StreamConstraints::default()).await.unwrap_err();
        assert!(err.is_camera_unavailable());
    }

    #[tokio::test]
    async fn test_still_image_camera_scales_to_preference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(400, 200, image::Rgb([9, 9, 9]))
            .save(&path)
            .unwrap();

        let device = StillImageCamera::new(&path);
        let small = StreamConstraints {
            ideal_width: 100,
            ideal_height: 100,
            ..StreamConstraints::default()
        };
        let stream = device.open(&small).await.unwrap();
        assert_eq!(stream.resolution(), (100, 50));

        let native = device.open(&StreamConstraints::default()).await.unwrap();
        assert_eq!(native.resolution(), (400, 200));
    }

    #[tokio::test]
    async fn test_still_image_camera_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let err = StillImageCamera::new(&path)
            .open(&StreamConstraints::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot decode"));
    }
}
