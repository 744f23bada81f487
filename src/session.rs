use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::geom::ScreenRect;
use crate::hocr;
use crate::review::OcrTextModel;
use crate::settings::Settings;

// The engine copes better with an upscaled single-channel bitmap; recognized
// coordinates are divided by the same factor on the way back out.
pub const IMAGE_RESIZE_FACTOR: u32 = 2;

pub trait ScreenGrabber {
    fn grab(&self, rect: ScreenRect) -> Result<DynamicImage, OcrError>;
}

pub struct OcrSession<G> {
    grabber: G,
    settings: Settings,
}

impl<G: ScreenGrabber> OcrSession<G> {
    pub fn new(grabber: G, settings: Settings) -> Self {
        Self { grabber, settings }
    }

    /// Runs one capture-recognize-parse pass over the target region and
    /// returns the text model bound to it. Blocks until the engine exits;
    /// any failure aborts the whole session and nothing is returned.
    pub fn recognize(&self, target: ScreenRect) -> Result<OcrTextModel, OcrError> {
        info!("running OCR");
        let capture = self.grabber.grab(target)?;
        let prepared = prepare_for_recognition(capture, IMAGE_RESIZE_FACTOR);

        // Both the capture image and the engine's markup output live in a
        // scoped directory, removed on every exit path; removal failures
        // are swallowed.
        let workdir = tempfile::Builder::new().prefix("screen-ocr").tempdir()?;
        let image_path = workdir.path().join("capture.png");
        prepared.save(&image_path)?;

        let output_base = workdir.path().join("capture");
        run_engine(
            &self.settings.engine_path,
            &image_path,
            &output_base,
            self.settings.language.as_deref(),
        )?;

        let markup_path = engine_output_path(&output_base)?;
        let markup = fs::read_to_string(&markup_path)?;
        debug!(bytes = markup.len(), "read engine markup");

        let document = hocr::parse_hocr(&markup, target.top_left(), IMAGE_RESIZE_FACTOR)?;
        debug!(
            chars = document.text_len,
            lines = document.line_starts.len(),
            words = document.words.len(),
            "parsed recognition result"
        );
        Ok(OcrTextModel::new(document, target))
    }
}

fn prepare_for_recognition(image: DynamicImage, scale: u32) -> image::GrayImage {
    let luma = image.to_luma8();
    if scale <= 1 {
        return luma;
    }
    let (width, height) = luma.dimensions();
    image::imageops::resize(
        &luma,
        width.saturating_mul(scale),
        height.saturating_mul(scale),
        FilterType::Lanczos3,
    )
}

fn run_engine(
    engine: &Path,
    image_path: &Path,
    output_base: &Path,
    language: Option<&str>,
) -> Result<(), OcrError> {
    let mut command = Command::new(engine);
    command.arg(image_path).arg(output_base);
    if let Some(language) = language {
        command.arg("-l").arg(language);
    }
    command.arg("hocr");
    suppress_window(&mut command);

    let output = command
        .output()
        .map_err(|err| OcrError::Engine(format!("failed to run {}: {err}", engine.display())))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Engine(format!(
            "{} exited with {}: {}",
            engine.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

// Older engine builds name the markup output .html, newer ones .hocr.
fn engine_output_path(output_base: &Path) -> Result<PathBuf, OcrError> {
    for ext in ["html", "hocr"] {
        let candidate = output_base.with_extension(ext);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(OcrError::Engine(format!(
        "engine produced no markup output at {}",
        output_base.display()
    )))
}

#[cfg(windows)]
fn suppress_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn suppress_window(_command: &mut Command) {}
