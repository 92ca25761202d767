//! Render surface: flicker-free inline redraws
//!
//! Remembers how many lines the previous frame occupied and erases exactly
//! that many before drawing the next one. No full-screen clears, no
//! scrollback pollution.

use crossterm::{cursor, queue, terminal};
use std::io::{self, Stdout, Write};

/// Fallback when the terminal width cannot be determined.
pub const DEFAULT_WIDTH: u16 = 80;

fn term_columns() -> Option<u16> {
    terminal::size().ok().map(|(cols, _)| cols)
}

pub struct Surface<W: Write> {
    out: W,
    last_lines: u16,
    columns: fn() -> Option<u16>,
}

impl Surface<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), term_columns)
    }
}

impl<W: Write> Surface<W> {
    /// Build a surface over an arbitrary writer with an injected column
    /// accessor. The accessor may report `None`; [`DEFAULT_WIDTH`] applies.
    pub fn new(out: W, columns: fn() -> Option<u16>) -> Self {
        Self {
            out,
            last_lines: 0,
            columns,
        }
    }

    /// Terminal width, queried once per render.
    pub fn width(&self) -> u16 {
        (self.columns)().unwrap_or(DEFAULT_WIDTH)
    }

    /// How many lines the last frame occupied.
    pub fn last_lines(&self) -> u16 {
        self.last_lines
    }

    /// Erase exactly the lines written by the previous draw.
    pub fn erase_last(&mut self) -> io::Result<()> {
        for _ in 0..self.last_lines {
            queue!(
                self.out,
                cursor::MoveUp(1),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
        }
        queue!(self.out, cursor::MoveToColumn(0))?;
        self.last_lines = 0;
        self.out.flush()
    }

    /// Erase the previous frame and draw a new one, recording its height.
    pub fn draw(&mut self, frame: &str) -> io::Result<()> {
        self.erase_last()?;
        let mut lines: u16 = 0;
        for line in frame.lines() {
            self.out.write_all(line.as_bytes())?;
            // Raw mode does not translate bare newlines
            self.out.write_all(b"\r\n")?;
            lines = lines.saturating_add(1);
        }
        self.last_lines = lines;
        self.out.flush()
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, cursor::Hide)?;
        self.out.flush()
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, cursor::Show)?;
        self.out.flush()
    }

    /// Consume the surface and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_records_line_count() {
        let mut surface = Surface::new(Vec::<u8>::new(), || None);
        surface.draw("one\ntwo\nthree\n").unwrap();
        assert_eq!(surface.last_lines(), 3);
    }

    #[test]
    fn test_redraw_erases_previous_frame() {
        let mut surface = Surface::new(Vec::<u8>::new(), || None);
        surface.draw("a\nb\n").unwrap();
        surface.draw("c\n").unwrap();
        let written = String::from_utf8(surface.into_inner()).unwrap();
        // Two cursor-up-and-clear pairs for the two lines of the first frame.
        assert_eq!(written.matches("\x1b[1A").count(), 2);
        assert!(written.contains("\x1b[2K"));
        assert!(written.contains("c\r\n"));
    }

    #[test]
    fn test_erase_resets_line_count() {
        let mut surface = Surface::new(Vec::<u8>::new(), || None);
        surface.draw("x\n").unwrap();
        surface.erase_last().unwrap();
        assert_eq!(surface.last_lines(), 0);
    }

    #[test]
    fn test_width_falls_back_to_default() {
        let surface = Surface::new(Vec::<u8>::new(), || None);
        assert_eq!(surface.width(), DEFAULT_WIDTH);
        let sized = Surface::new(Vec::<u8>::new(), || Some(120));
        assert_eq!(sized.width(), 120);
    }
}
