//! Terminal output for word lookups

use crate::index::reader::Candidate;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print one line per matching file, optionally followed by its occurrence contexts
pub fn print_candidates(candidates: &[Candidate], color: bool, show_contexts: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for candidate in candidates {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", candidate.path.display())?;
        stdout.reset()?;

        if show_contexts {
            write!(stdout, ":")?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(stdout, "{}", candidate.mask)?;
            stdout.reset()?;
        }
        writeln!(stdout)?;
    }

    Ok(())
}
