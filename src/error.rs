use std::{error::Error as StdError, fmt, io};

pub type Result<T> = ::std::result::Result<T, Error>;

pub enum Error {
    CommandBuilder(String),
    Config(String),
    Io(io::Error),
    Template(String),
    TemplateNotFound(String, Vec<&'static str>),
    ThinktankNotFound,
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CommandBuilder(msg) => write!(f, "Command error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Template(msg) => write!(f, "Template error: {}", msg),
            Error::TemplateNotFound(name, available) => write!(
                f,
                "Template '{}' not found. Available templates: {}",
                name,
                available.join(", ")
            ),
            Error::ThinktankNotFound => write!(
                f,
                "thinktank executable not found in PATH. Make sure thinktank \
                 is installed and available in your PATH."
            ),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
