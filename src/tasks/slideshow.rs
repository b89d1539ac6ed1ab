use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::{ShowOutcome, SlideshowController};
use crate::events::SlideshowCommand;
use crate::host::FigureHost;
use crate::timer::TimerService;

/// Owns the controller and serializes timer ticks and manual navigation.
///
/// Rules:
/// - The first figure is shown as soon as the task starts.
/// - `Tick` and `Next` advance forward, `Previous` steps back; each re-arms the timer.
/// - Ticks from a timer that a later transition replaced are dropped.
/// - Host failures are logged and the slideshow keeps running.
pub async fn run<H, T>(
    mut controller: SlideshowController<H, T>,
    mut commands: Receiver<SlideshowCommand>,
    cancel: CancellationToken,
) -> Result<()>
where
    H: FigureHost,
    T: TimerService,
{
    report(controller.start(), "start");

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting slideshow task");
                break;
            }

            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else {
                    debug!("command channel closed; exiting slideshow task");
                    break;
                };
                match cmd {
                    SlideshowCommand::Tick { generation } => {
                        if controller.accepts_tick(generation) {
                            report(controller.advance_forward(), "tick");
                        } else {
                            debug!(generation, current = controller.generation(), "stale tick ignored");
                        }
                    }
                    SlideshowCommand::Next => report(controller.advance_forward(), "next"),
                    SlideshowCommand::Previous => report(controller.advance_backward(), "previous"),
                }
            }
        }
    }

    Ok(())
}

fn report(result: crate::error::Result<ShowOutcome>, trigger: &'static str) {
    match result {
        Ok(ShowOutcome::Empty) => debug!(trigger, "nothing to display"),
        Ok(ShowOutcome::Displayed {
            position,
            figure_index,
            regenerated,
        }) => debug!(trigger, position, figure_index, regenerated, "transition complete"),
        Err(err) => warn!(trigger, "slideshow step failed: {err}"),
    }
}
