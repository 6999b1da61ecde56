use std::{
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    sync::{Mutex, Once},
};
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static INIT: Once = Once::new();

/// Installs the global subscriber the first time it's called; later calls are no-ops.
///
/// `RUST_LOG` takes precedence over `log_level`. Output goes to `log_file` when it can be opened
/// and to stderr otherwise.
pub fn init(log_level: &str, log_file: Option<&Path>) {
    INIT.call_once(|| {
        let writer = match log_file.and_then(open_log_file) {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(io::stderr),
        };

        let filter_layer = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(log_level.to_lowercase()))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false)
            .with_writer(writer);

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).ok()?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path).ok()
}
