// Error sink
//
// Where the player sends failures that happen away from the caller, such
// as a load error or a tick that could not be rescheduled.

use log::error;

use crate::error::FlipbookError;

/// Receives playback failures the host should know about.
pub trait ErrorSink: Send + Sync {
    fn report(&self, err: &FlipbookError);
}

/// Default sink: writes the error to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, err: &FlipbookError) {
        error!("flipbook: {}", err);
    }
}
