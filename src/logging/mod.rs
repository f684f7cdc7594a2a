//! Structured logging setup for realmcfg and the servers embedding it

use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required for `File` and `Both` output
    pub file_path: Option<String>,
    /// Include source file and line numbers
    pub include_source: bool,
    /// Trace-level output for the migration modules
    pub trace_migration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            _ => Err(format!("Invalid log output: {}", s)),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            file_path: None,
            include_source: false,
            trace_migration: false,
        }
    }
}

impl LogConfig {
    /// Verbose preset used by `--verbose`
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            include_source: true,
            trace_migration: true,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `REALMCFG_LOG_*` variables on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(level) = env_parsed::<LogLevel>("REALMCFG_LOG_LEVEL") {
            self.level = level;
        }

        if let Some(format) = env_parsed::<LogFormat>("REALMCFG_LOG_FORMAT") {
            self.format = format;
        }

        if let Some(output) = env_parsed::<LogOutput>("REALMCFG_LOG_OUTPUT") {
            self.output = output;
        }

        if let Ok(file_path) = std::env::var("REALMCFG_LOG_FILE") {
            self.file_path = Some(file_path);
        }

        if let Ok(include_source) = std::env::var("REALMCFG_LOG_SOURCE") {
            self.include_source = include_source.eq_ignore_ascii_case("true");
        }

        self
    }
}

fn env_parsed<T: FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|value| value.parse().ok())
}

/// Install the global tracing subscriber
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = create_filter(config);

    let layers: Vec<BoxedLayer> = match (config.output, config.file_path.as_deref()) {
        (LogOutput::Stderr, _) => vec![create_layer(config, Sink::Stderr)],
        (LogOutput::File, Some(path)) => vec![create_layer(config, Sink::File(open_log_file(path)?))],
        (LogOutput::Both, Some(path)) => vec![
            create_layer(config, Sink::Stderr),
            create_layer(config, Sink::File(open_log_file(path)?)),
        ],
        (LogOutput::File, None) | (LogOutput::Both, None) => {
            return Err("File path required for file output".into());
        }
    };

    tracing_subscriber::registry()
        .with(layers.with_filter(filter))
        .try_init()?;

    info!("Logging initialized with config: {:?}", config);
    Ok(())
}

fn create_filter(config: &LogConfig) -> EnvFilter {
    let mut directives = format!("realmcfg={}", config.level.as_directive());

    if config.trace_migration {
        directives.push_str(",realmcfg::config::migration=trace");
        directives.push_str(",realmcfg::config::carry=trace");
    }

    // RUST_LOG wins when set
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn open_log_file(path: &str) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

enum Sink {
    Stderr,
    File(std::fs::File),
}

fn create_layer(config: &LogConfig, sink: Sink) -> BoxedLayer {
    let base = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_file(config.include_source)
        .with_line_number(config.include_source);

    match (config.format, sink) {
        (LogFormat::Pretty, Sink::Stderr) => Box::new(base.pretty().with_writer(std::io::stderr)),
        (LogFormat::Compact, Sink::Stderr) => Box::new(base.compact().with_writer(std::io::stderr)),
        (LogFormat::Json, Sink::Stderr) => Box::new(base.json().with_writer(std::io::stderr)),
        (LogFormat::Pretty, Sink::File(file)) => {
            Box::new(base.pretty().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
        }
        (LogFormat::Compact, Sink::File(file)) => {
            Box::new(base.compact().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
        }
        (LogFormat::Json, Sink::File(file)) => {
            Box::new(base.json().with_writer(std::sync::Mutex::new(file)))
        }
    }
}

/// Time a block and log its duration
#[macro_export]
macro_rules! trace_performance {
    ($name:expr, $block:block) => {{
        let span = tracing::debug_span!("performance", operation = $name);
        let _enter = span.enter();
        let start = std::time::Instant::now();

        let result = $block;

        tracing::debug!(
            operation = $name,
            duration_us = start.elapsed().as_micros() as u64,
            "Performance trace"
        );

        result
    }};
}

/// Initialize logging for tests; repeated calls are no-ops
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Debug,
            trace_migration: true,
            ..LogConfig::default()
        };

        if let Err(e) = init_logging(&config) {
            eprintln!("Failed to initialize test logging: {}", e);
        }
    });
}
