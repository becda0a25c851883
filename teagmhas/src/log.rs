use std::sync::Mutex;

use lazy_static::lazy_static;

#[macro_export]
macro_rules! log {
    (ERROR, $($arg:tt)*) => { $crate::log::log_error(&format!($($arg)*)) };
    (INFO, $($arg:tt)*) => { $crate::log::log_info(&format!($($arg)*)) };
    (VERBOSE, $($arg:tt)*) => { $crate::log::log_verbose(&format!($($arg)*)) };
    ($($arg:tt)*) => { $crate::log::log_verbose(&format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_level {
    ($l:ident) => { $crate::log::set_log_level($crate::log::LogLevel::$l) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    NONE,
    ERROR,
    INFO,
    VERBOSE,
}

impl LogLevel {
    pub fn value(&self) -> u8 {
        match *self {
            LogLevel::NONE => 3,
            LogLevel::ERROR => 2,
            LogLevel::INFO => 1,
            LogLevel::VERBOSE => 0,
        }
    }
}

lazy_static! {
    static ref LOG_LEVEL: Mutex<LogLevel> = Mutex::new(LogLevel::INFO);
}

const TAG: &'static str = "teagmhas";

pub fn set_log_level(level: LogLevel) {
    *LOG_LEVEL.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = level;
}

pub fn log_level() -> LogLevel {
    *LOG_LEVEL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn enabled(level: LogLevel) -> bool {
    level.value() >= log_level().value()
}

pub fn log_error(string: &str) {
    if enabled(LogLevel::ERROR) {
        eprintln!("E {}: {}", TAG, string);
    }
}

pub fn log_info(string: &str) {
    if enabled(LogLevel::INFO) {
        println!("I {}: {}", TAG, string);
    }
}

pub fn log_verbose(string: &str) {
    if enabled(LogLevel::VERBOSE) {
        println!("V {}: {}", TAG, string);
    }
}
