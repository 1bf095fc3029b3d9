//! Text recognition backends.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, trace};

use super::{LayoutMode, NormalizedImage, RawText};
use crate::error::{KvittError, Result};

/// Image-to-text boundary.
///
/// Implementations must not keep the image past the call; the engine drops
/// the backing temp file as soon as recognition returns.
pub trait TextRecognizer: Send + Sync {
    /// Recognize all text in `image`.
    ///
    /// `layout` of `None` leaves the backend's own default segmentation.
    fn recognize(
        &self,
        image: &NormalizedImage,
        languages: &[String],
        layout: Option<LayoutMode>,
    ) -> Result<RawText>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Recognizer shelling out to the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    executable: String,
}

impl TesseractRecognizer {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Whether the executable can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        image: &NormalizedImage,
        languages: &[String],
        layout: Option<LayoutMode>,
    ) -> Result<RawText> {
        let mut command = Command::new(&self.executable);
        command.arg(image.path()).arg("stdout");
        if !languages.is_empty() {
            command.arg("-l").arg(languages.join("+"));
        }
        if let Some(mode) = layout {
            command.arg("--psm").arg(mode.psm().to_string());
        }

        trace!("Running {:?}", command);
        let output = command.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => KvittError::RecognitionUnavailable(format!(
                "'{}' not found (is tesseract installed?)",
                self.executable
            )),
            _ => KvittError::RecognitionUnavailable(format!(
                "failed to run '{}': {}",
                self.executable, e
            )),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KvittError::RecognitionUnavailable(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        debug!(
            "tesseract returned {} chars (layout {:?})",
            text.len(),
            layout
        );
        Ok(RawText::new(text.as_ref()))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// In-memory recognizer returning canned text.
///
/// Scripted responses are handed out in call order; once exhausted every
/// call gets the default text.
pub struct MockRecognizer {
    default: String,
    script: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
    layouts: Mutex<Vec<Option<LayoutMode>>>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_script(text, Vec::new())
    }

    pub fn with_script(default: impl Into<String>, script: Vec<Result<String>>) -> Self {
        Self {
            default: default.into(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            layouts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `recognize` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Layout modes requested so far, in call order.
    pub fn layouts(&self) -> Vec<Option<LayoutMode>> {
        self.layouts.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(
        &self,
        _image: &NormalizedImage,
        _languages: &[String],
        layout: Option<LayoutMode>,
    ) -> Result<RawText> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut layouts) = self.layouts.lock() {
            layouts.push(layout);
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(text)) => Ok(RawText::new(text)),
            Some(Err(e)) => Err(e),
            None => Ok(RawText::new(self.default.as_str())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::ImageNormalizer;
    use image::{DynamicImage, ImageBuffer, Rgb};

    fn image() -> NormalizedImage {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 8, Rgb([255, 255, 255])));
        ImageNormalizer::default().normalize_image(img, 1).unwrap()
    }

    #[test]
    fn test_mock_script_then_default() {
        let mock = MockRecognizer::with_script(
            "default",
            vec![
                Ok("first".to_string()),
                Err(KvittError::RecognitionUnavailable("down".to_string())),
            ],
        );
        let img = image();

        assert_eq!(mock.recognize(&img, &[], None).unwrap().original, "first");
        assert!(mock.recognize(&img, &[], Some(LayoutMode::SparseText)).is_err());
        assert_eq!(mock.recognize(&img, &[], None).unwrap().original, "default");
        assert_eq!(mock.calls(), 3);
        assert_eq!(
            mock.layouts(),
            vec![None, Some(LayoutMode::SparseText), None]
        );
    }

    #[test]
    fn test_missing_tesseract_is_unavailable() {
        let recognizer = TesseractRecognizer::new("kvitt-no-such-tesseract-binary");
        assert!(!recognizer.is_available());

        let err = recognizer
            .recognize(&image(), &["eng".to_string()], None)
            .unwrap_err();
        assert!(matches!(err, KvittError::RecognitionUnavailable(_)), "{err:?}");
    }
}
