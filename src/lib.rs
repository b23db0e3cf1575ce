pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod remote;
pub mod sync;

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether debug logging is active, shared between the logger filter and the config toggle.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}

/// Install the journal logger used by the binaries (`journalctl --user -t <identifier> -f`).
///
/// The daybook crate logs at info, or debug when toggled; everything else at warn.
/// Returns false when no journal is available, in which case logging stays off.
pub fn init_logging(identifier: &str, debug: bool) -> bool {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("daybook") || metadata.target().starts_with("sync_check") {
                let max = if debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier(identifier.to_string()),
        Err(_) => return false,
    };

    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_err() {
        return false;
    }
    // Global max must be Debug so daybook debug logs can pass through when toggled
    log::set_max_level(log::LevelFilter::Debug);
    true
}
