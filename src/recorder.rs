/// Error recorder module.
///
/// Every `BossError` is written out once, when it is built, through an
/// `ErrorRecorder`.  Constructors can be handed a recorder directly; the
/// ones that aren't use the process-wide default, which is picked by name
/// from config the same way the rest of the service picks its plugins.
use super::config::{CONSOLE_RECORDER, LOG_RECORDER, NONE_RECORDER};
use std::sync::OnceLock;

#[cfg(test)]
pub mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderType {
    None,
    Console,
    Log,
}

/// Map string name of an error recorder to enum.  If no match is found,
/// return RecorderType::Log so errors are never silently dropped.
pub fn get_recorder_type(name: &str) -> RecorderType {
    let lowered = name.to_lowercase();
    match lowered.as_str() {
        NONE_RECORDER => RecorderType::None,
        CONSOLE_RECORDER => RecorderType::Console,
        LOG_RECORDER => RecorderType::Log,
        _ => {
            log::warn!("Got unknown error recorder: {}", name);
            RecorderType::Log
        }
    }
}

pub fn recorder_factory(kind: RecorderType) -> Box<dyn ErrorRecorder + Send + Sync> {
    match kind {
        RecorderType::None => Box::new(NoneRecorder {}),
        RecorderType::Console => Box::new(ConsoleRecorder {}),
        RecorderType::Log => Box::new(LogRecorder {}),
    }
}

/// Shared by every request thread.  Set at most once.
static DEFAULT_RECORDER: OnceLock<Box<dyn ErrorRecorder + Send + Sync>> = OnceLock::new();

/// Install the process-wide recorder.  Returns false if one was already
/// installed (or already handed out), in which case nothing changes.
pub fn install(kind: RecorderType) -> bool {
    DEFAULT_RECORDER.set(recorder_factory(kind)).is_ok()
}

/// Get the process-wide recorder.  Falls back to `LogRecorder` if
/// `install()` was never called.
pub fn default_recorder() -> &'static dyn ErrorRecorder {
    let recorder = DEFAULT_RECORDER.get_or_init(|| recorder_factory(RecorderType::Log));
    &**recorder
}

pub trait ErrorRecorder {
    /// Write one line for an error that was just built.
    fn record(&self, status: u16, code: u32, message: &str);
}

/// Empty recorder.
pub struct NoneRecorder {}

impl ErrorRecorder for NoneRecorder {
    fn record(&self, _status: u16, _code: u32, _message: &str) {}
}

/// Most basic recorder - output to console.
pub struct ConsoleRecorder {}

impl ErrorRecorder for ConsoleRecorder {
    fn record(&self, status: u16, code: u32, message: &str) {
        println!("{}", format_record(status, code, message));
    }
}

/// Writes through the `log` facade at info level.
pub struct LogRecorder {}

impl ErrorRecorder for LogRecorder {
    fn record(&self, status: u16, code: u32, message: &str) {
        log::info!("{}", format_record(status, code, message));
    }
}

pub fn format_record(status: u16, code: u32, message: &str) -> String {
    format!(
        "BossError - Status: {} - Code: {} - Message: {}",
        status, code, message
    )
}
