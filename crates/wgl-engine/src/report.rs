//! User-facing failure reporting.
//!
//! Two channels:
//! - alerts: conditions the user has to see (no GPU, a program that failed to link)
//! - console: developer diagnostics (shader compiler output)
//!
//! Both go through the `log` facade under dedicated targets so they can be
//! filtered independently (`RUST_LOG=wgl::alert=error`).

/// Log target used for alerts.
pub const ALERT_TARGET: &str = "wgl::alert";

/// Log target used for console diagnostics.
pub const CONSOLE_TARGET: &str = "wgl::console";

/// Raises a user-facing alert.
pub fn alert(message: &str) {
    log::error!(target: ALERT_TARGET, "{message}");
}

/// Writes a developer-facing diagnostic.
pub fn console(message: &str) {
    log::warn!(target: CONSOLE_TARGET, "{message}");
}

/// Records `log` output per thread so tests can assert on what was reported.
#[cfg(test)]
pub(crate) mod capture {
    use std::cell::RefCell;
    use std::sync::Once;

    /// `(target, message)` pairs in emission order.
    pub(crate) type Records = Vec<(String, String)>;

    thread_local! {
        static ACTIVE: RefCell<Option<Records>> = const { RefCell::new(None) };
    }

    struct ThreadCapture;

    impl log::Log for ThreadCapture {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            ACTIVE.with(|active| {
                if let Some(records) = active.borrow_mut().as_mut() {
                    records.push((record.target().to_string(), record.args().to_string()));
                }
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: ThreadCapture = ThreadCapture;
    static INSTALL: Once = Once::new();

    /// Runs `f`, returning its result and everything logged on this thread meanwhile.
    pub(crate) fn records<R>(f: impl FnOnce() -> R) -> (R, Records) {
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });

        ACTIVE.with(|active| *active.borrow_mut() = Some(Vec::new()));
        let out = f();
        let records = ACTIVE.with(|active| active.borrow_mut().take()).unwrap_or_default();
        (out, records)
    }

    /// Index of the first record under `target` whose message contains `needle`.
    pub(crate) fn position(records: &Records, target: &str, needle: &str) -> Option<usize> {
        records
            .iter()
            .position(|(t, message)| t == target && message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_and_console_use_their_own_targets() {
        let ((), records) = capture::records(|| {
            console("shader log");
            alert("no program");
        });
        assert_eq!(capture::position(&records, CONSOLE_TARGET, "shader log"), Some(0));
        assert_eq!(capture::position(&records, ALERT_TARGET, "no program"), Some(1));
    }
}
