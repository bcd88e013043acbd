/// Camera bridge
///
/// The widget only knows the `CameraBridge` trait. On the desktop the real
/// bridge is an external capture program (`fswebcam`, `libcamera-still`,
/// ...) configured in `config.toml`; without one, the camera reports itself
/// unavailable.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::state::data::DataUri;

/// Why a capture produced no image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture cancelled")]
    Cancelled,
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available")]
    Unavailable,
    #[error("capture failed: {0}")]
    Failed(String),
    #[error("capture I/O error: {0}")]
    Io(String),
    #[error("captured image could not be decoded: {0}")]
    Decode(String),
}

/// How the bridge hands the photo back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    #[default]
    DataUrl,
}

/// Where the photo comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    /// Live camera, never the photo library
    #[default]
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraDirection {
    #[default]
    Rear,
    Front,
}

impl CameraDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraDirection::Rear => "rear",
            CameraDirection::Front => "front",
        }
    }
}

/// Options passed to every capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// JPEG quality, 1-100
    #[serde(deserialize_with = "deserialize_quality")]
    pub quality: u8,
    /// Let the user edit the photo before it is returned
    pub allow_editing: bool,
    /// Also keep a copy in the user's pictures directory
    pub save_to_gallery: bool,
    pub result_type: ResultType,
    pub source: CameraSource,
    pub direction: CameraDirection,
    /// Rotate pixels according to the EXIF orientation tag
    pub correct_orientation: bool,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            quality: 100,
            allow_editing: true,
            save_to_gallery: false,
            result_type: ResultType::DataUrl,
            source: CameraSource::Camera,
            direction: CameraDirection::Rear,
            correct_orientation: true,
        }
    }
}

/// Clamp any integer quality into 1..=100
fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(1, 100) as u8
}

fn deserialize_quality<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_quality)
}

/// Capability that takes a photo and returns it as a data URI
#[async_trait]
pub trait CameraBridge: Send + Sync {
    async fn capture(&self, options: &CameraOptions) -> Result<DataUri, CaptureError>;
}

/// Bridge used when no capture program is configured
#[derive(Debug, Default)]
pub struct UnavailableCamera;

#[async_trait]
impl CameraBridge for UnavailableCamera {
    async fn capture(&self, _options: &CameraOptions) -> Result<DataUri, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

static CAPTURE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Runs an external program that writes a photo to `{output}`
///
/// Placeholders substituted in the arguments:
/// - `{output}` - file the program must write
/// - `{quality}` - requested quality (1-100)
/// - `{facing}` - `rear` or `front`
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    gallery_dir: Option<PathBuf>,
}

impl CommandCamera {
    /// Build from `[program, args...]`; `None` for an empty command
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            gallery_dir: dirs::picture_dir().map(|dir| dir.join("image-upload")),
        })
    }

    /// Override where `save_to_gallery` copies land
    pub fn with_gallery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gallery_dir = Some(dir.into());
        self
    }

    fn expand_args(&self, output: &Path, options: &CameraOptions) -> Vec<String> {
        let output = output.to_string_lossy();
        let quality = options.quality.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &output)
                    .replace("{quality}", &quality)
                    .replace("{facing}", options.direction.as_str())
            })
            .collect()
    }

    async fn run(&self, output: &Path, options: &CameraOptions) -> Result<Vec<u8>, CaptureError> {
        let args = self.expand_args(output, options);
        tracing::debug!(program = %self.program, ?args, "running capture command");

        let result = tokio::process::Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CaptureError::Unavailable,
                ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
                _ => CaptureError::Io(e.to_string()),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            let reason = if stderr.is_empty() { result.status.to_string() } else { stderr };
            return Err(CaptureError::Failed(reason));
        }

        // Exiting cleanly without writing a photo means the user backed out
        match tokio::fs::read(output).await {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Err(CaptureError::Cancelled),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CaptureError::Cancelled),
            Err(e) => Err(CaptureError::Io(e.to_string())),
        }
    }

    async fn save_to_gallery(&self, mime: &str, bytes: &[u8]) {
        let Some(dir) = &self.gallery_dir else {
            tracing::warn!("no pictures directory, photo not saved to gallery");
            return;
        };
        let ext = ImageFormat::from_mime_type(mime)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("jpg");
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = dir.join(format!("capture-{}.{}", stamp, ext));

        let saved = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await
        };
        match saved.await {
            Ok(()) => tracing::info!(path = %path.display(), "📸 photo saved to gallery"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save photo to gallery"),
        }
    }
}

#[async_trait]
impl CameraBridge for CommandCamera {
    async fn capture(&self, options: &CameraOptions) -> Result<DataUri, CaptureError> {
        if options.allow_editing {
            tracing::debug!("in-capture editing is not supported by capture commands");
        }

        let output = std::env::temp_dir().join(format!(
            "image-upload-{}-{}.img",
            std::process::id(),
            CAPTURE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let captured = self.run(&output, options).await;
        let _ = tokio::fs::remove_file(&output).await;
        let bytes = captured?;

        let opts = options.clone();
        let (mime, bytes) = tokio::task::spawn_blocking(move || finish_capture(bytes, &opts))
            .await
            .map_err(|e| CaptureError::Failed(format!("task join error: {}", e)))??;

        if options.save_to_gallery {
            self.save_to_gallery(mime, &bytes).await;
        }

        tracing::info!(mime, bytes = bytes.len(), "📷 photo captured");
        Ok(DataUri::encode(mime, &bytes))
    }
}

/// Apply orientation correction and quality to freshly captured bytes
///
/// Untouched photos are passed through as-is; anything that needs rotating
/// or a lower quality is re-encoded as JPEG.
fn finish_capture(
    bytes: Vec<u8>,
    options: &CameraOptions,
) -> Result<(&'static str, Vec<u8>), CaptureError> {
    let decode_err = |e: image::ImageError| CaptureError::Decode(e.to_string());

    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| CaptureError::Io(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| CaptureError::Decode("unrecognized image data".to_string()))?;
    let mut decoder = reader.into_decoder().map_err(decode_err)?;

    let orientation = if options.correct_orientation {
        decoder.orientation().map_err(decode_err)?
    } else {
        Orientation::NoTransforms
    };
    let rotate = !matches!(orientation, Orientation::NoTransforms);

    if !rotate && options.quality >= 100 {
        drop(decoder);
        return Ok((format.to_mime_type(), bytes));
    }

    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, options.quality);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(decode_err)?;

    Ok(("image/jpeg", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_default_options() {
        let options = CameraOptions::default();
        assert_eq!(options.quality, 100);
        assert!(options.allow_editing);
        assert!(!options.save_to_gallery);
        assert_eq!(options.result_type, ResultType::DataUrl);
        assert_eq!(options.source, CameraSource::Camera);
        assert_eq!(options.direction, CameraDirection::Rear);
        assert!(options.correct_orientation);
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(clamp_quality(-5), 1);
        assert_eq!(clamp_quality(0), 1);
        assert_eq!(clamp_quality(85), 85);
        assert_eq!(clamp_quality(300), 100);
    }

    #[test]
    fn test_expand_args() {
        let command: Vec<String> = ["snap", "-q", "{quality}", "--facing={facing}", "{output}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let camera = CommandCamera::new(&command).unwrap();
        let options = CameraOptions { quality: 85, direction: CameraDirection::Front, ..Default::default() };

        let args = camera.expand_args(Path::new("/tmp/out.img"), &options);
        assert_eq!(args, vec!["-q", "85", "--facing=front", "/tmp/out.img"]);
    }

    #[test]
    fn test_empty_command_has_no_camera() {
        assert!(CommandCamera::new(&[]).is_none());
    }

    #[test]
    fn test_full_quality_passes_bytes_through() {
        let png = png_bytes(4, 2);
        let (mime, out) = finish_capture(png.clone(), &CameraOptions::default()).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(out, png);
    }

    #[test]
    fn test_lower_quality_reencodes_jpeg() {
        let options = CameraOptions { quality: 70, ..Default::default() };
        let (mime, out) = finish_capture(png_bytes(4, 2), &options).unwrap();
        assert_eq!(mime, "image/jpeg");

        let img = image::load_from_memory_with_format(&out, ImageFormat::Jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result = finish_capture(b"definitely not an image".to_vec(), &CameraOptions::default());
        assert!(matches!(result, Err(CaptureError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unavailable_camera() {
        let result = UnavailableCamera.capture(&CameraOptions::default()).await;
        assert_eq!(result, Err(CaptureError::Unavailable));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let camera = CommandCamera::new(&["image-upload-no-such-capture-tool".to_string()]).unwrap();
        let result = camera.capture(&CameraOptions::default()).await;
        assert_eq!(result, Err(CaptureError::Unavailable));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_that_writes_nothing_is_cancelled() {
        let camera = CommandCamera::new(&["true".to_string()]).unwrap();
        let result = camera.capture(&CameraOptions::default()).await;
        assert_eq!(result, Err(CaptureError::Cancelled));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_failure() {
        let camera = CommandCamera::new(&["false".to_string()]).unwrap();
        let result = camera.capture(&CameraOptions::default()).await;
        assert!(matches!(result, Err(CaptureError::Failed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_capture_returns_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("shot.png");
        let png = png_bytes(3, 3);
        std::fs::write(&source, &png).unwrap();

        let command = vec!["cp".to_string(), source.to_string_lossy().to_string(), "{output}".to_string()];
        let camera = CommandCamera::new(&command).unwrap().with_gallery_dir(dir.path().join("gallery"));
        let options = CameraOptions { save_to_gallery: true, ..Default::default() };

        let uri = camera.capture(&options).await.unwrap();
        assert_eq!(uri, DataUri::encode("image/png", &png));

        let saved: Vec<_> = std::fs::read_dir(dir.path().join("gallery")).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }
}
