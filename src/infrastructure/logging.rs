use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Sends log records to `path`, filtered by `RUST_LOG` (default `info`).
///
/// The terminal belongs to the UI, so without a file logging is disabled.
pub fn init_logging(path: Option<&Path>) -> std::io::Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    // A logger may already be installed, e.g. by a test harness.
    let _ = builder.try_init();
    Ok(())
}
