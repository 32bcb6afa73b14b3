//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn parse<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Parse(message.as_ref().to_string()))
    }

    pub(crate) fn file_open<T: AsRef<str>>(path: T) -> Error {
        Error::from(ErrorKind::FileOpen(path.as_ref().to_string()))
    }

    pub(crate) fn unknown_command<T: AsRef<str>>(program: T) -> Error {
        Error::from(ErrorKind::UnknownCommand(program.as_ref().to_string()))
    }

    pub(crate) fn argument<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Argument(message.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed command line, e.g. `>` with no filename.
    Parse(String),
    /// fork(2) or pipe(2) failed; the originating command is abandoned.
    ForkFailure,
    /// A redirection target could not be opened.
    FileOpen(String),
    /// The program could not be executed.
    UnknownCommand(String),
    /// A built-in was given the wrong arguments. The message is user facing.
    Argument(String),
    Docopt,
    Io,
    Nix,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::Parse(ref message) => write!(f, "syntax error: {}", message),
            ErrorKind::ForkFailure => write!(f, "process creation failed"),
            ErrorKind::FileOpen(ref path) => write!(f, "unable to open file {}", path),
            ErrorKind::UnknownCommand(ref program) => write!(f, "{}: unknown command", program),
            ErrorKind::Argument(ref message) => write!(f, "{}", message),
            ErrorKind::Docopt => write!(f, "Docopt error occurred"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
