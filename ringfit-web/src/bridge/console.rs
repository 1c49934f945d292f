//! `log` sink that writes to the browser console
//!
//! Errors and warnings keep their console severity so they show up in the
//! devtools filter; debug and trace both go to `console.log`.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;
use web_sys::console;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::log_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger; later calls only change the level
pub fn init_logging(level: LevelFilter) {
    // Already installed on a second call
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
