use std::error;
use std::fmt;
use std::io;




/**
 * Error to represent a failure to save or restore level data.
 */
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Encode(String),
    Decode(String),
    LayoutMismatch { expected: usize, found: usize },
    ComponentMismatch { expected: usize, found: usize },
    BufferSize { position: usize, expected: usize, found: usize },
    PatchNotLocal(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use Error::*;

        match self {
            Io(e) => write!(fmt, "i/o error: {}", e),
            Encode(e) => write!(fmt, "could not encode checkpoint: {}", e),
            Decode(e) => write!(fmt, "could not decode checkpoint: {}", e),
            LayoutMismatch { expected, found } => write!(fmt, "checkpoint has {} boxes that do not match the {} boxes of the layout", found, expected),
            ComponentMismatch { expected, found } => write!(fmt, "checkpoint has {} components, expected {}", found, expected),
            BufferSize { position, expected, found } => write!(fmt, "patch {} has {} bytes, expected {}", position, found, expected),
            PatchNotLocal(position) => write!(fmt, "patch {} is not owned by this process", position),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
