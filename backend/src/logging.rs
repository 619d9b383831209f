//! Logging bootstrap and the process-wide named logger registry.
//!
//! [`init`] installs a JSON `tracing` subscriber writing to stdout and to a
//! file inside the configured log directory. [`logger`] hands out named
//! loggers: each is a span carrying a `logger` field, created once per name
//! on first use and shared afterwards.
//!
//! Lifecycle: call [`init`] before the first [`logger`] lookup so spans are
//! created against the installed subscriber; keep the returned
//! [`LoggingGuard`] alive until shutdown, dropping it flushes the file sink.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logger for process lifecycle events.
pub const ROOT: &str = "root";
/// Logger for server start and shutdown.
pub const WEBSERVER: &str = "webserver";
/// Logger for the access log stage.
pub const ACCESS: &str = "access";
/// Logger for handler failures.
pub const APIS: &str = "apis";
/// Logger for pipeline stages.
pub const MIDDLEWARES: &str = "middlewares";
/// Logger for outbound REST calls.
pub const CLIENTS: &str = "clients";

const DEFAULT_FILTER: &str = "debug";

/// Failures while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {path}: {source}")]
    Directory {
        /// Requested directory.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },
    /// The log file could not be opened.
    #[error("failed to open log file in {path}: {source}")]
    File {
        /// Log directory.
        path: PathBuf,
        /// Underlying failure.
        source: InitError,
    },
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Keeps the background file writer alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: WorkerGuard,
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `debug` filter. Records go to stdout and
/// to `<log_dir>/<file_name>.log`, both as JSON lines.
///
/// # Errors
///
/// Returns [`LoggingError`] when the directory or file cannot be created or
/// a subscriber is already installed.
pub fn init(log_dir: &Path, file_name: &str) -> Result<LoggingGuard, LoggingError> {
    cap_std::fs::Dir::create_ambient_dir_all(log_dir, cap_std::ambient_authority()).map_err(
        |source| LoggingError::Directory {
            path: log_dir.to_path_buf(),
            source,
        },
    )?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|source| LoggingError::File {
            path: log_dir.to_path_buf(),
            source,
        })?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()?;

    Ok(LoggingGuard { _file: guard })
}

/// Named logger handed out by the registry.
///
/// Events emitted inside [`Logger::in_scope`] carry `logger = <name>`.
#[derive(Debug, Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

#[derive(Debug)]
struct LoggerInner {
    name: String,
    span: Span,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.to_owned(),
                span: tracing::info_span!("logger", logger = %name),
            }),
        }
    }

    /// Registry key.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Span to use as a parent for narrower contexts.
    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Run `f` with this logger's span entered.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.inner.span.in_scope(f)
    }

    /// Whether both handles point at the same cached logger.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Lazily populated cache of [`Logger`]s keyed by name.
///
/// Each key owns a `OnceLock`, so concurrent first lookups of one name build
/// exactly one logger while lookups of other names proceed independently.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    slots: RwLock<HashMap<String, Arc<OnceLock<Logger>>>>,
}

impl LoggerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached logger for `name`, creating it on first use.
    pub fn get(&self, name: &str) -> Logger {
        self.slot(name).get_or_init(|| Logger::new(name)).clone()
    }

    /// Names looked up so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Forget every cached logger; later lookups build fresh ones.
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn slot(&self, name: &str) -> Arc<OnceLock<Logger>> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_owned()).or_default())
    }
}

static REGISTRY: OnceLock<LoggerRegistry> = OnceLock::new();

/// Process-wide registry.
pub fn registry() -> &'static LoggerRegistry {
    REGISTRY.get_or_init(LoggerRegistry::new)
}

/// Cached logger for `name` from the process-wide registry.
///
/// # Examples
/// ```
/// use account_service::logging;
///
/// let first = logging::logger(logging::ACCESS);
/// let second = logging::logger(logging::ACCESS);
/// assert!(first.same_as(&second));
/// ```
pub fn logger(name: &str) -> Logger {
    registry().get(name)
}
