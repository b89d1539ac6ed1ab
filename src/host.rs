//! Hosts supply the live figure collection and interpret the visible marker.
//!
//! The controller re-queries its host at the start of every operation, so a
//! host must report current membership rather than a snapshot taken earlier.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::events::VisibilityChanged;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub trait FigureHost {
    type Figure: Clone + PartialEq + fmt::Debug;

    /// Ordered collection of figures eligible for display right now.
    fn figures(&self) -> Result<Vec<Self::Figure>>;

    /// Set or clear the visible marker on `figure`.
    fn set_visible(&mut self, figure: &Self::Figure, visible: bool);

    /// Drop markers held by figures no longer in `present`.
    fn retain_present(&mut self, present: &[Self::Figure]) {
        let _ = present;
    }
}

/// In-memory host. Clones share the same figures, so a caller can keep a
/// handle to add or remove figures while a controller owns another.
#[derive(Debug)]
pub struct MemoryHost<F> {
    inner: Arc<Mutex<MemoryFigures<F>>>,
}

#[derive(Debug)]
struct MemoryFigures<F> {
    figures: Vec<(F, bool)>,
    shown: Vec<F>,
}

impl<F> Clone for MemoryHost<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> Default for MemoryHost<F> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryFigures {
                figures: Vec::new(),
                shown: Vec::new(),
            })),
        }
    }
}

impl<F: Clone + Eq + Hash> MemoryHost<F> {
    pub fn new<I>(figures: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        let host = Self::default();
        for figure in figures {
            host.push(figure);
        }
        host
    }

    fn lock(&self) -> MutexGuard<'_, MemoryFigures<F>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a figure; duplicates are ignored.
    pub fn push(&self, figure: F) -> bool {
        let mut state = self.lock();
        if state.figures.iter().any(|(f, _)| *f == figure) {
            return false;
        }
        state.figures.push((figure, false));
        true
    }

    pub fn remove(&self, figure: &F) -> bool {
        let mut state = self.lock();
        let before = state.figures.len();
        state.figures.retain(|(f, _)| f != figure);
        state.figures.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Figures currently carrying the visible marker.
    pub fn visible(&self) -> Vec<F> {
        self.lock()
            .figures
            .iter()
            .filter(|(_, visible)| *visible)
            .map(|(f, _)| f.clone())
            .collect()
    }

    /// Every figure that was marked visible, in order.
    pub fn shown(&self) -> Vec<F> {
        self.lock().shown.clone()
    }

    pub fn distinct_shown(&self) -> HashSet<F> {
        self.lock().shown.iter().cloned().collect()
    }
}

impl<F> FigureHost for MemoryHost<F>
where
    F: Clone + Eq + Hash + fmt::Debug,
{
    type Figure = F;

    fn figures(&self) -> Result<Vec<F>> {
        Ok(self.lock().figures.iter().map(|(f, _)| f.clone()).collect())
    }

    fn set_visible(&mut self, figure: &F, visible: bool) {
        let mut state = self.lock();
        let Some(entry) = state.figures.iter_mut().find(|(f, _)| f == figure) else {
            return;
        };
        entry.1 = visible;
        if visible {
            state.shown.push(figure.clone());
        }
    }
}

/// Figures are image files under a library directory, re-scanned per query.
#[derive(Debug)]
pub struct DirectoryHost {
    root: PathBuf,
    visible: HashSet<PathBuf>,
    events: Option<Sender<VisibilityChanged>>,
}

impl DirectoryHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            visible: HashSet::new(),
            events: None,
        }
    }

    /// Publish marker flips on `events` (for the viewer task).
    pub fn with_events(mut self, events: Sender<VisibilityChanged>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_visible(&self, path: &Path) -> bool {
        self.visible.contains(path)
    }

    fn publish(&self, path: &Path, visible: bool) {
        let Some(events) = &self.events else {
            return;
        };
        let change = VisibilityChanged {
            path: path.to_path_buf(),
            visible,
        };
        match events.try_send(change) {
            Ok(()) => {}
            Err(TrySendError::Full(change)) => {
                warn!(path = %change.path.display(), "viewer queue full; dropping visibility change");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("viewer channel closed; visibility change not delivered");
            }
        }
    }
}

impl FigureHost for DirectoryHost {
    type Figure = PathBuf;

    fn figures(&self) -> Result<Vec<PathBuf>> {
        let meta = match std::fs::metadata(&self.root) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::BadLibrary(format!(
                    "{} does not exist",
                    self.root.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        if !meta.is_dir() {
            return Err(Error::BadLibrary(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let mut figures: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_image(p))
            .collect();
        figures.sort();
        Ok(figures)
    }

    fn set_visible(&mut self, figure: &PathBuf, visible: bool) {
        let changed = if visible {
            self.visible.insert(figure.clone())
        } else {
            self.visible.remove(figure)
        };
        if changed {
            self.publish(figure, visible);
        }
    }

    fn retain_present(&mut self, present: &[PathBuf]) {
        let gone: Vec<PathBuf> = self
            .visible
            .iter()
            .filter(|p| !present.contains(*p))
            .cloned()
            .collect();
        for path in gone {
            self.visible.remove(&path);
            debug!(path = %path.display(), "visible figure left the library");
            self.publish(&path, false);
        }
    }
}

#[inline]
fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if IMAGE_EXTENSIONS.contains(&e.as_str())
    )
}
