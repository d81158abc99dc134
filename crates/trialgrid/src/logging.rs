use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Hands out writers that append to one shared log file
#[derive(Clone)]
struct FileWriterFactory {
    file: Arc<Mutex<File>>,
}

struct FileWriter {
    file: Arc<Mutex<File>>,
}

impl FileWriter {
    fn lock(&self) -> io::Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

impl<'a> MakeWriter<'a> for FileWriterFactory {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: self.file.clone(),
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let default_filter = format!("trialgrid={level},trialgrid_core={level}");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize logging.
///
/// Without `log_file` events go to stderr so they never mix with the report
/// on stdout. With `log_file` they are appended to that file instead.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(log_file: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let factory = FileWriterFactory {
                file: Arc::new(Mutex::new(file)),
            };
            registry
                .with(
                    fmt::layer()
                        .with_writer(factory)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_names(true),
                )
                .try_init()?;
            tracing::info!(log_path = %path.display(), "Logging initialized");
        }
        None => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(false)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    Ok(())
}
