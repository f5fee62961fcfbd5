//! Hand-rolled `log::Log` backend, the only logger the workspace
//! bundles — `piecetree-buffer` itself only ever depends on the `log`
//! facade. A file-backed logger installed alongside a panic hook that
//! logs backtraces before the process unwinds.

use std::fs::File;
use std::io::Write;
use std::ops::Deref;
use std::panic;
use std::path::Path;
use std::sync::Mutex;

use log::LevelFilter;

struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Install the file logger at `path`. `debug` raises the level to
/// `Debug`; otherwise only `Info` and above are written.
pub fn init_logger(path: &Path, debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("could not open log file {}: {e}", path.display());
            return;
        }
    };
    let logger = FileLogger {
        level,
        file: Mutex::new(file),
    };
    log::set_max_level(level);
    let _ = log::set_boxed_logger(Box::new(logger));
}

/// Log a backtrace and the panic message before the default hook
/// prints to stderr, so a crash is still visible in the log file.
pub fn init_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let backtrace = std::backtrace::Backtrace::capture();
        let (file, line) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line()))
            .unwrap_or(("<unknown>", 0));

        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref)
            .or_else(|| panic_info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("<cause unknown>");

        log::error!("panic at {file}:{line}: {cause}\n{backtrace}");
        default_hook(panic_info);
    }));
}
