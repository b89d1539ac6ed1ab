//! Shuffle-and-advance sequencing over a live figure collection.
//!
//! The controller keeps a permutation of `[0, N)` and a cursor into it. The
//! permutation is regenerated whenever the cursor sits at the start of a lap
//! or the host reports a different figure count than the permutation covers,
//! so one lap of forward steps shows every figure exactly once.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::Result;
use crate::host::FigureHost;
use crate::timer::{TimerHandle, TimerService};

/// Invoked when an armed delay elapses, with the generation of that arm.
pub type TickCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The host had no figures; the timer was still re-armed.
    Empty,
    Displayed {
        /// Cursor into the shuffled order.
        position: usize,
        /// Index into the host's figure collection.
        figure_index: usize,
        /// Whether the shuffled order was regenerated for this show.
        regenerated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Stay,
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy)]
enum RegenerateReason {
    LapStart,
    CollectionResized { previous: usize },
}

pub struct SlideshowController<H: FigureHost, T: TimerService> {
    host: H,
    timer: T,
    rng: StdRng,
    interval: Duration,
    on_tick: TickCallback,
    order: Vec<usize>,
    cursor: usize,
    armed: Option<TimerHandle>,
    generation: u64,
    regenerations: u64,
}

impl<H: FigureHost, T: TimerService> SlideshowController<H, T> {
    pub fn new(host: H, timer: T, interval: Duration, rng: StdRng, on_tick: TickCallback) -> Self {
        Self {
            host,
            timer,
            rng,
            interval,
            on_tick,
            order: Vec::new(),
            cursor: 0,
            armed: None,
            generation: 0,
            regenerations: 0,
        }
    }

    /// Display the first figure and arm the auto-advance timer.
    pub fn start(&mut self) -> Result<ShowOutcome> {
        info!(interval = ?self.interval, "slideshow starting");
        self.show()
    }

    /// Render the figure under the cursor and re-arm the timer.
    pub fn show(&mut self) -> Result<ShowOutcome> {
        self.step(Step::Stay)
    }

    /// Move one figure forward, wrapping (and reshuffling) at the end of a lap.
    pub fn advance_forward(&mut self) -> Result<ShowOutcome> {
        self.step(Step::Forward)
    }

    /// Move one figure back, wrapping to the last position of the current order.
    pub fn advance_backward(&mut self) -> Result<ShowOutcome> {
        self.step(Step::Backward)
    }

    /// Whether a tick armed under `generation` is still the live one.
    pub fn accepts_tick(&self, generation: u64) -> bool {
        self.armed.is_some() && generation == self.generation
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// How many times the shuffled order has been generated.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    fn step(&mut self, step: Step) -> Result<ShowOutcome> {
        let figures = match self.host.figures() {
            Ok(figures) => figures,
            Err(err) => {
                // Keep the slideshow ticking so a transient host failure recovers.
                self.rearm();
                return Err(err);
            }
        };
        let len = figures.len();

        match step {
            Step::Stay => {}
            Step::Forward => {
                self.cursor += 1;
                if self.cursor >= len {
                    self.cursor = 0;
                }
            }
            Step::Backward => {
                self.cursor = if self.cursor == 0 {
                    len.saturating_sub(1)
                } else {
                    self.cursor - 1
                };
            }
        }

        let outcome = self.display(&figures);
        self.rearm();
        Ok(outcome)
    }

    fn display(&mut self, figures: &[H::Figure]) -> ShowOutcome {
        self.host.retain_present(figures);
        let len = figures.len();
        if len == 0 {
            self.order.clear();
            self.cursor = 0;
            debug!("no figures to display");
            return ShowOutcome::Empty;
        }
        if self.cursor >= len {
            self.cursor %= len;
        }

        let previous = self.order.len();
        let regenerated = if previous != len {
            self.regenerate(len, RegenerateReason::CollectionResized { previous });
            true
        } else if self.cursor == 0 {
            self.regenerate(len, RegenerateReason::LapStart);
            true
        } else {
            false
        };

        let figure_index = self.order[self.cursor];
        for (idx, figure) in figures.iter().enumerate() {
            self.host.set_visible(figure, idx == figure_index);
        }
        debug!(
            position = self.cursor,
            figure_index,
            figure = ?figures[figure_index],
            "figure shown"
        );

        ShowOutcome::Displayed {
            position: self.cursor,
            figure_index,
            regenerated,
        }
    }

    fn regenerate(&mut self, len: usize, reason: RegenerateReason) {
        self.order.clear();
        self.order.extend(0..len);
        self.order.shuffle(&mut self.rng);
        self.regenerations += 1;

        match reason {
            RegenerateReason::CollectionResized { previous } => info!(
                figures = len,
                previous,
                reason = ?reason,
                "shuffled order regenerated"
            ),
            RegenerateReason::LapStart => debug!(
                figures = len,
                reason = ?reason,
                "shuffled order regenerated"
            ),
        }
    }

    fn rearm(&mut self) {
        if let Some(handle) = self.armed.take() {
            self.timer.cancel(handle);
        }
        self.generation += 1;
        let generation = self.generation;
        let on_tick = Arc::clone(&self.on_tick);
        let handle = self
            .timer
            .schedule(self.interval, Box::new(move || on_tick(generation)));
        self.armed = Some(handle);
        debug!(%handle, generation, delay = ?self.interval, "auto-advance armed");
    }
}

impl<H: FigureHost, T: TimerService> Drop for SlideshowController<H, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.armed.take() {
            self.timer.cancel(handle);
        }
    }
}
