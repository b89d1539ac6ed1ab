use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::SlideshowCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Navigate(SlideshowCommand),
    Quit,
}

/// Map one line of operator input to an action.
pub fn parse_command(line: &str) -> Option<InputAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" | "" => Some(InputAction::Navigate(SlideshowCommand::Next)),
        "p" | "prev" | "previous" => Some(InputAction::Navigate(SlideshowCommand::Previous)),
        "q" | "quit" | "exit" => Some(InputAction::Quit),
        _ => None,
    }
}

/// Forward navigation typed on `reader` until EOF, `quit`, or cancellation.
/// `quit` cancels the whole pipeline; EOF only ends this task.
pub async fn run<R>(
    reader: R,
    to_slideshow: Sender<SlideshowCommand>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read operator input")? else {
                    debug!("input closed");
                    break;
                };
                match parse_command(&line) {
                    Some(InputAction::Navigate(cmd)) => {
                        if to_slideshow.send(cmd).await.is_err() {
                            warn!("slideshow channel closed; dropping input");
                            break;
                        }
                    }
                    Some(InputAction::Quit) => {
                        info!("quit requested; initiating shutdown");
                        cancel.cancel();
                        break;
                    }
                    None => warn!(input = line.trim(), "unrecognized command (use n, p, or q)"),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn parses_navigation_words() {
        assert_eq!(
            parse_command(" N "),
            Some(InputAction::Navigate(SlideshowCommand::Next))
        );
        assert_eq!(
            parse_command(""),
            Some(InputAction::Navigate(SlideshowCommand::Next))
        );
        assert_eq!(
            parse_command("previous"),
            Some(InputAction::Navigate(SlideshowCommand::Previous))
        );
        assert_eq!(parse_command("q"), Some(InputAction::Quit));
        assert_eq!(parse_command("jump"), None);
    }

    #[tokio::test]
    async fn forwards_commands_until_quit() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let input: &[u8] = b"n\nbogus\np\nq\nn\n";

        run(input, tx, cancel.clone()).await.unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(rx.recv().await, Some(SlideshowCommand::Next));
        assert_eq!(rx.recv().await, Some(SlideshowCommand::Previous));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn eof_does_not_cancel() {
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let input: &[u8] = b"p\n";

        run(input, tx, cancel.clone()).await.unwrap();
        assert!(!cancel.is_cancelled());
    }
}
