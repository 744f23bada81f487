use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("ocr engine invocation failed: {0}")]
    Engine(String),

    #[error("invalid hocr markup: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("unexpected hocr structure: {0}")]
    MalformedMarkup(String),

    #[error("failed to write capture image: {0}")]
    Image(#[from] image::ImageError),

    #[error("temp file io failed: {0}")]
    Io(#[from] std::io::Error),
}
