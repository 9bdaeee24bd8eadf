//! FrameSource trait - tracking sample abstraction
//!
//! Decouples the producer loop from where frames come from (tracking runtime,
//! synthetic generator, recorded stream).

use crate::Frame;

/// Frame source trait
///
/// Sources are opened fallibly by their constructor; once open, `pull` always
/// yields a frame. Opening failure is fatal at startup and never retried.
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn FrameSource> = open_source(&config.source)?;
/// let frame = source.pull();
/// println!("t = {}", frame.timestamp);
/// ```
pub trait FrameSource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Sample the current state
    fn pull(&mut self) -> Frame;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn pull(&mut self) -> Frame {
        (**self).pull()
    }
}
