use std::path::PathBuf;

/// Commands serialized through the slideshow task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideshowCommand {
    /// Auto-advance fired by the timer armed under `generation`.
    Tick { generation: u64 },
    /// Manual "next".
    Next,
    /// Manual "previous".
    Previous,
}

/// Emitted by a host whenever a figure's visible marker flips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChanged {
    pub path: PathBuf,
    pub visible: bool,
}
