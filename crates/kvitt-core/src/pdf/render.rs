//! Page rasterization through poppler's `pdftoppm`.

use std::io::{ErrorKind, Write};
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, warn};

use super::Result;
use crate::error::PdfError;

/// Renders single PDF pages to PNG with an external `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    executable: String,
}

impl PageRenderer {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Whether the executable can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable).arg("-v").output().is_ok()
    }

    /// Render `page` (1-indexed) at `dpi`.
    ///
    /// `Ok(None)` when the renderer is not installed. Input and output
    /// files live in a temporary directory removed on return.
    pub fn render_page(&self, data: &[u8], page: u32, dpi: u32) -> Result<Option<DynamicImage>> {
        let dir = tempfile::Builder::new()
            .prefix("kvitt-render-")
            .tempdir()
            .map_err(render_error)?;
        let input = dir.path().join("input.pdf");
        let output_prefix = dir.path().join("page");
        let output = output_prefix.with_extension("png");

        std::fs::File::create(&input)
            .and_then(|mut f| f.write_all(data))
            .map_err(render_error)?;

        let page = page.to_string();
        let result = Command::new(&self.executable)
            .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page, "-singlefile"])
            .arg(&input)
            .arg(&output_prefix)
            .output();

        let output_status = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} not found, cannot rasterize PDF pages", self.executable);
                return Ok(None);
            }
            Err(e) => return Err(render_error(e)),
        };
        if !output_status.status.success() {
            return Err(PdfError::Render(format!(
                "{} exited with {}: {}",
                self.executable,
                output_status.status,
                String::from_utf8_lossy(&output_status.stderr).trim()
            )));
        }

        let image = image::open(&output).map_err(|e| PdfError::Render(e.to_string()))?;
        debug!(
            "Rendered page {} at {} dpi: {}x{}",
            page,
            dpi,
            image.width(),
            image.height()
        );
        Ok(Some(image))
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

fn render_error(err: std::io::Error) -> PdfError {
    PdfError::Render(err.to_string())
}
