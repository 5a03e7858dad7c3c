//! Logging setup for the bean container
//!
//! Every container event is emitted under the `bean_container` target:
//! registrations and locking at `DEBUG`, resolution state changes, cache hits
//! and hook halts at `TRACE`. This module installs a `tracing-subscriber`
//! for applications that do not bring their own.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Multi-line human-readable output
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_container::logging;
//!
//! // JSON if logging-json is enabled, pretty otherwise
//! logging::init();
//!
//! // Or configure explicitly
//! logging::builder()
//!     .trace()
//!     .compact()
//!     .container_only()
//!     .with_directive("my_app=info")
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "bean_container";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line, human-readable
    Pretty,
    /// Single line per event
    Compact,
}

/// Builder for subscriber configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    container_only: bool,
    directives: Vec<String>,
    from_env: bool,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            container_only: false,
            directives: Vec::new(),
            from_env: false,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a builder with default settings (JSON, `DEBUG`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Show resolution state changes
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Show registrations only
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Apply the level to the container's target only
    pub fn container_only(mut self) -> Self {
        self.container_only = true;
        self
    }

    /// Add an `EnvFilter` directive such as `my_app=info`
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Start from `RUST_LOG` when it is set
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Include source file names
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include line numbers
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread IDs (useful when tracing concurrent resolution)
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// The filter directives this builder produces, in application order.
    pub fn directives(&self) -> Vec<String> {
        let base = if self.container_only {
            format!("{TARGET}={}", self.level)
        } else {
            self.level.to_string()
        };
        std::iter::once(base)
            .chain(self.directives.iter().cloned())
            .collect()
    }

    /// Install the subscriber, failing if one is already set
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        use tracing_subscriber::{EnvFilter, filter::Directive, fmt, prelude::*};

        let env = if self.from_env {
            std::env::var(EnvFilter::DEFAULT_ENV).ok()
        } else {
            None
        };
        let filter = env
            .into_iter()
            .chain(self.directives())
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::default(), EnvFilter::add_directive);

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);
        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer.compact()).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        }
    }

    /// Install the subscriber; a subscriber that is already set wins
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// No-op without `logging-json` or `logging-pretty`
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize with defaults: JSON if `logging-json` is enabled, pretty otherwise
pub fn init() {
    if cfg!(feature = "logging-json") {
        builder().json().init();
    } else {
        builder().pretty().init();
    }
}

/// Initialize with JSON output
pub fn init_json() {
    builder().json().init();
}

/// Initialize with pretty output
pub fn init_pretty() {
    builder().pretty().init();
}

/// Trace the container's own events only, honoring `RUST_LOG` for the rest
pub fn init_container_only() {
    builder().trace().compact().container_only().from_env().init();
}
