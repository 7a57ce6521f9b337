use std::io::{Stderr, Write};
use std::sync::{LazyLock, Mutex};

use once_cell::sync::OnceCell;
use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static TERMINAL_STDERR: LazyLock<Mutex<Stderr>> = LazyLock::new(|| Mutex::new(std::io::stderr()));

static LOGGER_HANDLE: OnceCell<Handle<EnvFilter, Registry>> = OnceCell::new();

struct LockingTerminalStderr;
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LockingTerminalStderr {
    type Writer = LockingTerminalStderr;

    fn make_writer(&'a self) -> Self::Writer {
        LockingTerminalStderr
    }
}

impl Write for LockingTerminalStderr {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut guard) = TERMINAL_STDERR.lock() {
            guard.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut guard) = TERMINAL_STDERR.lock() {
            guard.flush()?
        }
        Ok(())
    }
}

/// The log filter for a verbosity level.
///
/// `RUST_LOG` takes precedence when set.
pub(crate) fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,unisearch=error",
        // Only show warnings
        Verbosity::Verbose(0) => {
            "off,unisearch=warn,unisearch_core=warn,unisearch_sdk=warn,unisearch_catalog=warn"
        },
        // Show our own info logs
        Verbosity::Verbose(1) => {
            "off,unisearch=info,unisearch_core=info,unisearch_sdk=info,unisearch_catalog=info"
        },
        // Also show debug from our libraries
        Verbosity::Verbose(2) => {
            "off,unisearch=debug,unisearch_core=debug,unisearch_sdk=debug,unisearch_catalog=debug"
        },
        Verbosity::Verbose(3) => {
            "off,unisearch=trace,unisearch_core=trace,unisearch_sdk=trace,unisearch_catalog=trace"
        },
        // Also show the http stack
        Verbosity::Verbose(4) => "debug,unisearch=trace,unisearch_sdk=trace,unisearch_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Initialize the logger, or update its filter if it's already initialized.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl tracing_subscriber::util::SubscriberInitExt,
    Handle<EnvFilter, Registry>,
) {
    debug!("Initializing logger");
    let filter = EnvFilter::new("warn");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(LockingTerminalStderr)
        .without_time()
        .with_target(false);
    let registry = tracing_subscriber::registry().with(filter).with(log_layer);

    (registry, filter_reload_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(4),
            Verbosity::Verbose(9),
        ] {
            let filter = log_filter(verbosity);
            assert!(
                EnvFilter::try_new(filter).is_ok(),
                "invalid filter for {verbosity:?}: {filter}"
            );
        }
    }

    #[test]
    fn library_warnings_shown_by_default() {
        for crate_name in ["unisearch", "unisearch_core", "unisearch_sdk", "unisearch_catalog"] {
            assert!(
                log_filter(Verbosity::Verbose(0)).contains(&format!("{crate_name}=warn")),
                "{crate_name} warnings hidden"
            );
            assert!(
                log_filter(Verbosity::Verbose(1)).contains(&format!("{crate_name}=info")),
                "{crate_name} info hidden"
            );
        }
    }
}
