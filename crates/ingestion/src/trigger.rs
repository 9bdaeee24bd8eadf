//! Stop trigger - an empty line on standard input ends the run

use std::io::BufRead;
use std::thread::JoinHandle;

use dispatcher::StopSignal;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Why the trigger fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An empty line was read
    EmptyLine,
    /// Input reached end-of-file
    EndOfInput,
}

/// Block until an empty line or end of input
///
/// Non-empty lines are ignored.
pub fn wait_for_stop_line<R: BufRead>(reader: R) -> Result<StopReason> {
    for line in reader.lines() {
        let line = line?;
        if line.trim_end_matches('\r').is_empty() {
            return Ok(StopReason::EmptyLine);
        }
        debug!(len = line.len(), "Ignoring input line");
    }
    Ok(StopReason::EndOfInput)
}

/// Watch standard input on a dedicated thread and cancel `stop` when it fires
///
/// The thread is detached from the runtime, so a read still pending at exit
/// does not hold up shutdown.
pub fn spawn_stdin_trigger(stop: StopSignal) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("stdin-stop".to_string())
        .spawn(move || {
            match wait_for_stop_line(std::io::stdin().lock()) {
                Ok(reason) => info!(?reason, "Stop requested from standard input"),
                Err(e) => warn!(error = %e, "Standard input failed, stopping"),
            }
            stop.cancel();
        })?;
    Ok(handle)
}
