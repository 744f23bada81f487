use tracing_subscriber::fmt;

pub fn init(verbose: bool) {
    if !verbose {
        return;
    }
    let _ = fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}
