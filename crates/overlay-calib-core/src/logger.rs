//! Log output for tools built on the calibration engine.
//!
//! Library code only talks to the `log` facade (and, with the `tracing`
//! feature, emits spans around the solvers). A binary picks one backend:
//!
//! - [`init_with_level`]: plain lines on stderr, `LEVEL target: message`;
//! - [`init_tracing`]: a `tracing-subscriber` pipeline on stderr, human-readable
//!   or JSON, which also forwards `log` records.

use std::io::Write;
use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    filter::LevelFilter as TraceLevel, fmt, fmt::format::FmtSpan, util::SubscriberInitExt,
    util::TryInitError, EnvFilter,
};

struct LineLogger {
    level: LevelFilter,
}

impl Log for LineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "{}", format_line(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `WARN overlay_calib::session: message`; module paths are kept so solver
/// and session output can be told apart.
fn format_line(record: &Record) -> String {
    format!(
        "{:<5} {}: {}",
        record.level(),
        record.target(),
        record.args()
    )
}

static LOGGER: OnceLock<LineLogger> = OnceLock::new();

/// Install the stderr line logger. The first call decides the level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    log::set_logger(LOGGER.get_or_init(|| LineLogger { level }))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(feature = "tracing")]
fn trace_level(level: LevelFilter) -> TraceLevel {
    match level {
        LevelFilter::Off => TraceLevel::OFF,
        LevelFilter::Error => TraceLevel::ERROR,
        LevelFilter::Warn => TraceLevel::WARN,
        LevelFilter::Info => TraceLevel::INFO,
        LevelFilter::Debug => TraceLevel::DEBUG,
        LevelFilter::Trace => TraceLevel::TRACE,
    }
}

/// Install a `tracing` subscriber writing to stderr.
///
/// `level` is the default filter; `RUST_LOG` directives override it. Span
/// closings are reported, so `debug` shows how long each derivation took.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(trace_level(level).into())
        .from_env_lossy();
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.compact().finish().try_init()
    }
}
