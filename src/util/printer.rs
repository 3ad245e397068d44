use compile_time_ls_colours::file_type_colour;
use std::{
    io::{self, BufWriter, IsTerminal as _, Stdout, Write, stdout},
    os::unix::ffi::OsStrExt as _,
    path::Path,
};

const NEWLINE: &[u8] = b"\n";
const NEWLINE_CRLF: &[u8] = b"/\n";
const NEWLINE_RESET: &[u8] = b"\x1b[0m\n";
const NEWLINE_CRLF_RESET: &[u8] = b"/\x1b[0m\n";

const NULL_TERMINATED_CRLF: &[u8] = b"/\0";
const NULL_TERMINATED_NEWLINE: &[u8] = b"\0";
// look up tables indexed by "is this a directory"
const NEWLINES_RESET: [&[u8]; 2] = [NEWLINE_RESET, NEWLINE_CRLF_RESET];
const NEWLINES_PLAIN: [&[u8]; 2] = [NEWLINE, NEWLINE_CRLF];
const NULL_TERMINATED_PLAIN: [&[u8]; 2] = [NULL_TERMINATED_NEWLINE, NULL_TERMINATED_CRLF];

const RESET: &[u8] = b"\x1b[0m";

/// Output options for [`Printer`]
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
pub struct PrintOptions {
    /// Stop after this many paths
    pub limit: Option<usize>,
    /// Never colour, also disabled by the `NO_COLOUR`/`NO_COLOR` environment variables
    pub nocolour: bool,
    /// Terminate paths with NUL instead of a newline (for `xargs -0`)
    pub null_terminated: bool,
    /// The paths are directories, they get a trailing `/`
    pub directories: bool,
}

/// Writes found paths to stdout, coloured when stdout is a terminal.
pub struct Printer<W: Write = Stdout> {
    writer: BufWriter<W>,
    use_colour: bool,
    options: PrintOptions,
    written: usize,
}

impl Printer<Stdout> {
    #[must_use]
    pub fn stdout(options: PrintOptions) -> Self {
        let std_out = stdout();
        let is_terminal = std_out.is_terminal();
        let use_colour = is_terminal && !colour_disabled(options.nocolour);
        let writer = if is_terminal {
            BufWriter::new(std_out)
        } else {
            BufWriter::with_capacity(16 * 4096, std_out)
        };
        Self {
            writer,
            use_colour,
            options,
            written: 0,
        }
    }
}

impl<W: Write> Printer<W> {
    /// A plain (never coloured) printer over any writer
    pub fn new(writer: W, options: PrintOptions) -> Self {
        Self {
            writer: BufWriter::new(writer),
            use_colour: false,
            options,
            written: 0,
        }
    }

    /// Whether the limit has been reached
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.options.limit.is_some_and(|limit| self.written >= limit)
    }

    /**
     Writes one path, unless the limit has already been reached

     # Errors
     Returns the underlying write error
    */
    pub fn write_path(&mut self, path: &Path) -> io::Result<()> {
        if self.is_full() {
            return Ok(());
        }
        let is_dir = usize::from(self.options.directories);
        if self.use_colour {
            self.writer
                .write_all(path_colour(path, self.options.directories))?;
            self.writer.write_all(path.as_os_str().as_bytes())?;
            self.writer.write_all(NEWLINES_RESET[is_dir])?;
        } else {
            let terminators = if self.options.null_terminated {
                NULL_TERMINATED_PLAIN
            } else {
                NEWLINES_PLAIN
            };
            self.writer.write_all(path.as_os_str().as_bytes())?;
            self.writer.write_all(terminators[is_dir])?;
        }
        self.written += 1;
        Ok(())
    }

    /**
     Writes every path in `paths`, stopping at the limit

     # Errors
     Returns the underlying write error
    */
    pub fn write_all<'p, I>(&mut self, paths: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'p Path>,
    {
        for path in paths {
            if self.is_full() {
                break;
            }
            self.write_path(path)?;
        }
        Ok(())
    }

    /**
     Flushes and hands back the writer

     # Errors
     Returns the flush error
    */
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

fn colour_disabled(nocolour: bool) -> bool {
    nocolour
        || std::env::var("NO_COLOUR").is_ok_and(|x| x.eq_ignore_ascii_case("TRUE"))
        || std::env::var("NO_COLOR").is_ok_and(|x| x.eq_ignore_ascii_case("TRUE"))
}

#[inline]
fn path_colour(path: &Path, is_dir: bool) -> &[u8] {
    if is_dir {
        return file_type_colour!(directory);
    }
    path.extension().map_or(RESET, |extension| {
        let pos = extension.as_bytes();
        file_type_colour!(pos)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> PrintOptions {
        PrintOptions {
            limit: None,
            nocolour: true,
            null_terminated: false,
            directories: false,
        }
    }

    #[test]
    fn writes_one_path_per_line() {
        let mut printer = Printer::new(Vec::<u8>::new(), options());
        printer
            .write_all([Path::new("/t/a.txt"), Path::new("/t/b.txt")])
            .unwrap();
        assert_eq!(printer.finish().unwrap(), b"/t/a.txt\n/t/b.txt\n");
    }

    #[test]
    fn directories_get_a_slash_and_nul() {
        let opts = PrintOptions {
            null_terminated: true,
            directories: true,
            ..options()
        };
        let mut printer = Printer::new(Vec::<u8>::new(), opts);
        printer.write_path(Path::new("/t/sub")).unwrap();
        assert_eq!(printer.finish().unwrap(), b"/t/sub/\0");
    }

    #[test]
    fn stops_at_the_limit() {
        let opts = PrintOptions {
            limit: Some(1),
            ..options()
        };
        let mut printer = Printer::new(Vec::<u8>::new(), opts);
        printer
            .write_all([Path::new("/a"), Path::new("/b")])
            .unwrap();
        assert!(printer.is_full());
        assert_eq!(printer.finish().unwrap(), b"/a\n");
    }
}
