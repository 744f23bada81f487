#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use screen_ocr::{
    OcrError, OcrSession, OcrTextModel, OffsetText, ScreenGrabber, ScreenPoint, ScreenRect,
    Settings,
};

const STUB_HOCR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html><body><div class="ocr_page"><span class="ocr_line"><span class="ocr_word" title="bbox 0 0 90 20">Hello</span> <span class="ocr_word" title="bbox 100 0 200 20">world</span></span></div></body></html>"#;

struct SolidGrabber;

impl ScreenGrabber for SolidGrabber {
    fn grab(&self, rect: ScreenRect) -> Result<image::DynamicImage, OcrError> {
        let image = image::RgbaImage::from_pixel(
            rect.width().max(1),
            rect.height().max(1),
            image::Rgba([255, 255, 255, 255]),
        );
        Ok(image::DynamicImage::ImageRgba8(image))
    }
}

struct FailingGrabber;

impl ScreenGrabber for FailingGrabber {
    fn grab(&self, _rect: ScreenRect) -> Result<image::DynamicImage, OcrError> {
        Err(OcrError::Capture("display is gone".to_string()))
    }
}

fn write_stub_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("stub-engine.sh");
    fs::write(&path, body).expect("write stub engine");
    let mut perms = fs::metadata(&path).expect("stat stub engine").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub engine");
    path
}

fn session_with(engine: PathBuf) -> OcrSession<SolidGrabber> {
    let settings = Settings {
        engine_path: engine,
        language: None,
    };
    OcrSession::new(SolidGrabber, settings)
}

fn recognize(script: &str) -> (Result<OcrTextModel, OcrError>, Option<PathBuf>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("output-base.txt");
    let script = script.replace("{marker}", &marker.display().to_string());
    let engine = write_stub_engine(dir.path(), &script);

    let result = session_with(engine).recognize(ScreenRect::new(10, 20, 110, 60));
    let base = fs::read_to_string(&marker).ok().map(PathBuf::from);
    (result, base)
}

#[test]
fn recognizes_text_via_the_stub_engine() {
    let script = format!(
        "#!/bin/sh\nprintf '%s' \"$2\" > \"{{marker}}\"\ncat > \"$2.html\" <<'EOF'\n{STUB_HOCR}\nEOF\n"
    );
    let (result, base) = recognize(&script);
    let model = result.expect("recognize");

    assert_eq!(model.story_length(), 11);
    assert_eq!(model.text_in_range(0, model.story_length()), "Hello world");
    assert_eq!(model.line_range_at(0), 0..11);
    assert_eq!(model.word_range_at(0), 0..6);
    assert_eq!(model.word_range_at(6), 6..11);
    // Engine coordinates are halved and shifted by the capture origin.
    assert_eq!(model.point_for_offset(0), ScreenPoint { x: 10, y: 20 });
    assert_eq!(model.point_for_offset(6), ScreenPoint { x: 60, y: 20 });
    assert_eq!(model.location(), ScreenRect::new(10, 20, 110, 60));

    // Both transient files are gone once the session returns.
    let base = base.expect("stub engine ran");
    assert!(!base.with_extension("png").exists());
    assert!(!base.with_extension("html").exists());
    assert!(!base.parent().expect("workdir").exists());
}

#[test]
fn engine_failure_aborts_the_session_and_cleans_up() {
    let script = "#!/bin/sh\nprintf '%s' \"$2\" > \"{marker}\"\necho boom >&2\nexit 3\n";
    let (result, base) = recognize(script);
    let err = result.expect_err("engine failure");
    assert!(matches!(err, OcrError::Engine(_)));
    assert!(err.to_string().contains("boom"));

    let base = base.expect("stub engine ran");
    assert!(!base.with_extension("png").exists());
    assert!(!base.parent().expect("workdir").exists());
}

#[test]
fn engine_writing_no_output_is_an_engine_error() {
    let script = "#!/bin/sh\nexit 0\n";
    let (result, _) = recognize(script);
    assert!(matches!(result, Err(OcrError::Engine(_))));
}

#[test]
fn malformed_engine_output_aborts_the_session() {
    let script = "#!/bin/sh\nprintf '%s' '<div><span class=\"ocr_word\">x</span></div>' > \"$2.html\"\n";
    let (result, _) = recognize(script);
    assert!(matches!(result, Err(OcrError::MalformedMarkup(_))));
}

#[test]
fn capture_failure_aborts_the_session() {
    let settings = Settings::default();
    let session = OcrSession::new(FailingGrabber, settings);
    let err = session
        .recognize(ScreenRect::new(0, 0, 10, 10))
        .expect_err("capture failure");
    assert!(matches!(err, OcrError::Capture(_)));
}

#[test]
fn language_selector_is_passed_to_the_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args_file = dir.path().join("args.txt");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\ncat > \"$2.html\" <<'EOF'\n{STUB_HOCR}\nEOF\n",
        args_file.display()
    );
    let engine = write_stub_engine(dir.path(), &script);
    let settings = Settings {
        engine_path: engine,
        language: Some("deu".to_string()),
    };
    let session = OcrSession::new(SolidGrabber, settings);
    session
        .recognize(ScreenRect::new(0, 0, 50, 50))
        .expect("recognize");

    let args: Vec<String> = fs::read_to_string(&args_file)
        .expect("recorded args")
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(args.len(), 5);
    assert!(args[0].ends_with("capture.png"));
    assert!(args[1].ends_with("capture"));
    assert_eq!(&args[2..], ["-l", "deu", "hocr"]);
}
