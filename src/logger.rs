use std::io::{self, Write as _};

pub struct Logger;

fn format_record(record: &log::Record) -> String {
    format!(
        "{level:<5} {file}:{line} > {text}",
        level = record.level(),
        file = record.file().unwrap_or_else(|| record.target()),
        line = record
            .line()
            .map_or_else(|| "??".to_string(), |line| line.to_string()),
        text = record.args(),
    )
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);
        // NOTE: diagnostics go to stderr, progress to stdout.
        if record.level() <= log::Level::Warn {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl Logger {
    pub fn init() {
        log::set_logger(&Logger).expect("could not set logger");
        log::set_max_level(if cfg!(debug_assertions) {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record() {
        let line = format_record(
            &log::Record::builder()
                .args(format_args!("window mapped"))
                .level(log::Level::Info)
                .target("triangle::app")
                .file(Some("src/app.rs"))
                .line(Some(42))
                .build(),
        );
        assert_eq!(line, "INFO  src/app.rs:42 > window mapped");
    }

    #[test]
    fn test_format_record_without_location() {
        let line = format_record(
            &log::Record::builder()
                .args(format_args!("oops"))
                .level(log::Level::Error)
                .target("triangle")
                .build(),
        );
        assert_eq!(line, "ERROR triangle:?? > oops");
    }
}
