use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use screen_ocr::{
    OcrError, OcrSession, OffsetText, ScreenGrabber, ScreenRect, languages, logging, settings,
};

#[derive(Parser, Debug)]
#[command(
    name = "screen-ocr",
    version,
    about = "Recognize text in a captured screen region with positional output"
)]
struct Cli {
    /// Image file standing in for the captured screen region
    #[arg(short = 'i', long = "image")]
    image: Option<PathBuf>,

    /// Screen x coordinate of the region's left edge
    #[arg(long = "left", default_value_t = 0)]
    left: i32,

    /// Screen y coordinate of the region's top edge
    #[arg(long = "top", default_value_t = 0)]
    top: i32,

    /// Engine language code (e.g. eng); defaults from settings or the system locale
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Path to the OCR engine binary
    #[arg(short = 'e', long = "engine")]
    engine: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Print the parsed document (text, lines, words) as JSON
    #[arg(long = "json")]
    json: bool,

    /// Show the engine's installed languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

struct FileGrabber {
    path: PathBuf,
}

impl ScreenGrabber for FileGrabber {
    fn grab(&self, _rect: ScreenRect) -> Result<image::DynamicImage, OcrError> {
        image::open(&self.path)
            .map_err(|err| OcrError::Capture(format!("{}: {err}", self.path.display())))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut settings = settings::load_settings(cli.read_settings.as_deref())?;
    if let Some(engine) = cli.engine {
        settings.engine_path = engine;
    }
    if let Some(lang) = cli.lang {
        settings.language = Some(lang);
    }
    if settings.language.is_none() {
        if let Ok(locale) = std::env::var("LANG") {
            let table = languages::LocaleTable::load()?;
            settings.language = table.engine_language(&locale).map(str::to_string);
        }
    }

    if cli.show_languages {
        for language in languages::available_languages(&settings.engine_path)? {
            println!("{language}");
        }
        return Ok(());
    }

    let image_path = cli.image.ok_or_else(|| anyhow!("--image is required"))?;
    let (width, height) = image::image_dimensions(&image_path)
        .with_context(|| format!("failed to read {}", image_path.display()))?;
    let rect = ScreenRect::new(
        cli.left,
        cli.top,
        cli.left + width as i32,
        cli.top + height as i32,
    );

    let session = OcrSession::new(FileGrabber { path: image_path }, settings);
    let model = session.recognize(rect)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(model.document())?);
        return Ok(());
    }

    let mut offset = 0;
    while offset < model.story_length() {
        let line = model.line_range_at(offset);
        println!("{}", model.text_in_range(line.start, line.end).trim_end());
        offset = line.end;
    }
    Ok(())
}
