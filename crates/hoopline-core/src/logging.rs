//! Log output that cooperates with the stage spinners

use indicatif::MultiProgress;

/// `[LEVEL]` tag with a fixed-width label, optionally colored.
fn level_tag(level: log::Level, color: bool) -> String {
    let (label, ansi) = match level {
        log::Level::Error => ("ERROR", "31"),
        log::Level::Warn => ("WARN ", "33"),
        log::Level::Info => ("INFO ", "32"),
        log::Level::Debug => ("DEBUG", "36"),
        log::Level::Trace => ("TRACE", "35"),
    };
    if color {
        format!("[\x1b[{ansi}m{label}\x1b[0m]")
    } else {
        format!("[{label}]")
    }
}

/// Routes records through [`MultiProgress::suspend`] so lines land above
/// the spinners. Filtering stays with the wrapped `env_logger`.
struct SpinnerAwareLogger {
    filter: env_logger::Logger,
    bars: MultiProgress,
}

impl log::Log for SpinnerAwareLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        log::Log::enabled(&self.filter, metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.filter.matches(record) {
            return;
        }
        let line = format!("{} {}", level_tag(record.level(), true), record.args());
        self.bars.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {}
}

/// Default filter for the given flags. `RUST_LOG` still wins.
fn default_level(quiet: bool, debug: bool) -> &'static str {
    match (debug, quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    }
}

/// Install the global logger.
///
/// With `multi` (stderr is a TTY) records go above the progress lines.
/// Otherwise each record is a plain `secs [LEVEL] msg` line.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level(quiet, debug)),
    );

    match multi {
        Some(bars) => {
            let filter = builder.build();
            let max_level = filter.filter();
            let logger = SpinnerAwareLogger {
                filter,
                bars: bars.clone(),
            };
            if log::set_boxed_logger(Box::new(logger)).is_ok() {
                log::set_max_level(max_level);
            }
        }
        None => {
            let _ = builder
                .format(|buf, record| {
                    let tag = level_tag(record.level(), false);
                    writeln!(buf, "{} {tag} {}", buf.timestamp_seconds(), record.args())
                })
                .try_init();
        }
    }
}
