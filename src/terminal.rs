//! Line-driven terminal front-end.
//!
//! Words are drawn in place on a single line while a background thread
//! forwards stdin lines over a channel. The loop itself is single-threaded:
//! it waits on that channel with a timeout no longer than the next playback
//! deadline, then polls the [`DeadlineScheduler`].

use anyhow::{Context, Result};
use speedread_core::cancellation::CancellationToken;
use speedread_core::playback::PlaybackState;
use speedread_core::progress::save_progress;
use speedread_core::scheduler::DeadlineScheduler;
use speedread_core::{ReaderSession, SessionCommand};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const IDLE_POLL: Duration = Duration::from_millis(50);
const PACE_STEP: u32 = 25;

const HELP: &str = "\
Controls (type then Enter):
  <Enter> | p   play / pause
  r             reset to the first word
  b [n]         back n words (default jump)
  f [n]         forward n words
  [             back one paragraph
  ]             forward one paragraph
  + | -         faster / slower
  w <wpm>       set the pace
  s             save progress
  ?             this help
  q             save and quit";

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Session(SessionCommand),
    AdjustPace(i64),
    Save,
    Help,
    Quit,
}

type Reader = ReaderSession<DeadlineScheduler>;

pub fn run_reader(
    session: &mut Reader,
    progress_dir: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let inputs = spawn_input_reader();
    let mut stdin_open = true;
    let mut out = io::stdout();

    writeln!(out, "{HELP}")?;
    if let Some(document) = session.document() {
        writeln!(
            out,
            "{}: {} words, {} paragraphs",
            document.source_name(),
            document.len(),
            document.paragraph_count()
        )?;
    }
    session.toggle();

    loop {
        if cancel.is_cancelled() {
            info!("Interrupted; leaving the reader");
            break;
        }

        let now = Instant::now();
        if let Some(ticket) = session.scheduler_mut().poll(now) {
            if session.on_timer(ticket).is_some() {
                draw_word(&mut out, session)?;
            }
            if session.state() == PlaybackState::Finished {
                writeln!(out, "\nEnd of document. Enter replays, q quits.")?;
            }
            continue;
        }

        if !stdin_open && !session.is_playing() {
            debug!("Input closed and playback idle; leaving the reader");
            break;
        }

        let wait = session
            .scheduler()
            .deadline()
            .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(now))
            .min(IDLE_POLL);

        if !stdin_open {
            thread::sleep(wait);
            continue;
        }
        match inputs.recv_timeout(wait) {
            Ok(line) => match parse_input(&line) {
                Some(Input::Quit) => break,
                Some(input) => handle_input(&mut out, session, input, progress_dir)?,
                None => writeln!(out, "\nUnknown command {line:?}; ? for help")?,
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => stdin_open = false,
        }
    }

    writeln!(out)?;
    save_current_progress(&mut out, session, progress_dir)
}

fn handle_input(
    out: &mut impl Write,
    session: &mut Reader,
    input: Input,
    progress_dir: &Path,
) -> Result<()> {
    match input {
        Input::Session(command) => {
            let event = session.apply_command(command);
            debug!(action = event.action, state = ?event.snapshot.state, "Applied command");
            if !session.is_playing() {
                draw_word(out, session)?;
                write_status(out, session)?;
            }
        }
        Input::AdjustPace(delta) => {
            let wanted = i64::from(session.settings().reading_pace) + delta;
            let wpm = u32::try_from(wanted.max(0)).unwrap_or(u32::MAX);
            let applied = session.set_target_pace(wpm);
            writeln!(out, "\npace {applied} wpm")?;
        }
        Input::Save => save_current_progress(out, session, progress_dir)?,
        Input::Help => writeln!(out, "\n{HELP}")?,
        Input::Quit => {}
    }
    out.flush()?;
    Ok(())
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("p");
    let count = parts.next().and_then(|n| n.parse::<usize>().ok());
    let input = match head {
        "p" => Input::Session(SessionCommand::TogglePlayback),
        "r" => Input::Session(SessionCommand::Reset),
        "b" => Input::Session(SessionCommand::BackWords { n: count }),
        "f" => Input::Session(SessionCommand::ForwardWords { n: count }),
        "[" => Input::Session(SessionCommand::BackParagraph),
        "]" => Input::Session(SessionCommand::ForwardParagraph),
        "+" => Input::AdjustPace(i64::from(PACE_STEP)),
        "-" => Input::AdjustPace(-i64::from(PACE_STEP)),
        "w" => Input::Session(SessionCommand::SetPace {
            wpm: u32::try_from(count?).unwrap_or(u32::MAX),
        }),
        "s" => Input::Save,
        "?" | "h" => Input::Help,
        "q" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn draw_word(out: &mut impl Write, session: &Reader) -> Result<()> {
    let word = session.current_word().unwrap_or("");
    match ansi_color(&session.settings().text_color) {
        Some(code) => write!(out, "\r\x1b[2K\x1b[1;{code}m{word}\x1b[0m")?,
        None => write!(out, "\r\x1b[2K\x1b[1m{word}\x1b[0m")?,
    }
    out.flush()?;
    Ok(())
}

fn write_status(out: &mut impl Write, session: &Reader) -> Result<()> {
    let snapshot = session.snapshot();
    let paragraph = snapshot
        .paragraph
        .map(|p| format!(" | paragraph {}/{}", p.current, p.total))
        .unwrap_or_default();
    writeln!(
        out,
        "\n[{:?}] {}/{} words{} | {} wpm | remaining {}",
        snapshot.state,
        snapshot.words_read,
        snapshot.total_words,
        paragraph,
        snapshot.target_pace,
        snapshot.remaining_label
    )?;
    Ok(())
}

fn save_current_progress(
    out: &mut impl Write,
    session: &Reader,
    progress_dir: &Path,
) -> Result<()> {
    let Some(record) = session.to_progress_record() else {
        warn!("No document loaded; nothing to save");
        return Ok(());
    };
    let path = save_progress(progress_dir, &record, chrono::Local::now())
        .context("Failed to save reading progress")?;
    writeln!(out, "progress saved to {}", path.display())?;
    out.flush()?;
    Ok(())
}

/// SGR foreground code for the basic color names settings commonly hold.
fn ansi_color(name: &str) -> Option<u8> {
    let code = match name.trim().to_ascii_lowercase().as_str() {
        "black" => 30,
        "red" => 31,
        "green" => 32,
        "yellow" => 33,
        "blue" => 34,
        "magenta" | "purple" => 35,
        "cyan" => 36,
        "white" => 37,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_and_playback_commands() {
        assert_eq!(
            parse_input(""),
            Some(Input::Session(SessionCommand::TogglePlayback))
        );
        assert!(matches!(
            parse_input("b 25"),
            Some(Input::Session(SessionCommand::BackWords { n: Some(25) }))
        ));
        assert!(matches!(
            parse_input("f"),
            Some(Input::Session(SessionCommand::ForwardWords { n: None }))
        ));
        assert!(matches!(
            parse_input("]"),
            Some(Input::Session(SessionCommand::ForwardParagraph))
        ));
        assert!(matches!(
            parse_input("w 450"),
            Some(Input::Session(SessionCommand::SetPace { wpm: 450 }))
        ));
        assert_eq!(parse_input("w"), None);
        assert_eq!(parse_input("-"), Some(Input::AdjustPace(-25)));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input("zzz"), None);
    }

    #[test]
    fn maps_basic_color_names() {
        assert_eq!(ansi_color("Blue"), Some(34));
        assert_eq!(ansi_color("#ff0000"), None);
    }
}
