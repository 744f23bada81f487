pub mod error;
pub mod geom;
pub mod hocr;
pub mod languages;
pub mod logging;
pub mod review;
pub mod session;
pub mod settings;

pub use error::OcrError;
pub use geom::{ScreenPoint, ScreenRect};
pub use hocr::{HocrDocument, OcrWord, parse_hocr};
pub use review::{OcrTextModel, OffsetText};
pub use session::{IMAGE_RESIZE_FACTOR, OcrSession, ScreenGrabber};
pub use settings::{Settings, load_settings};
