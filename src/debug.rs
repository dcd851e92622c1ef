//! Debug facilities.
use nom::error::{VerboseError, VerboseErrorKind};
use std::{
    fmt::{self, Display},
    io,
};

use crate::{graph::GraphError, parser::ParseError};

// Error types and From<...> implementations

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    #[cfg(not(tarpaulin_include))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Vertex {:?} does not exist after offset normalization", .0)]
    GraphError(GraphError),
    #[error("Error while parsing input file with graph description: {:?}", .0)]
    ParseError(Vec<VerboseErrorKind>),
    #[error("I/O error: {0}")]
    IoError(io::Error),
    #[error("Invalid configuration: {0}")]
    ConfigError(ConfigError),
}

impl From<GraphError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ge: GraphError) -> Self {
        Self::GraphError(ge)
    }
}

#[cfg(not(tarpaulin_include))]
fn handle_nom_verbose_error(verbose: VerboseError<&str>) -> Vec<VerboseErrorKind> {
    verbose
        .errors
        .into_iter()
        .map(|(input, kind)| {
            let token = input.split_whitespace().next().unwrap_or("<end of input>");
            log::debug!("parse error {:?} at token {:?}", kind, token);
            kind
        })
        .collect()
}

impl<'a> From<nom::Err<ParseError<'a>>> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(pe: nom::Err<ParseError<'a>>) -> Self {
        match pe {
            nom::Err::Error(verbose) | nom::Err::Failure(verbose) => {
                Self::ParseError(handle_nom_verbose_error(verbose))
            }
            // Only complete parsers are used.
            nom::Err::Incomplete(_) => unreachable!(),
        }
    }
}

impl From<io::Error> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ie: io::Error) -> Self {
        Self::IoError(ie)
    }
}

impl From<tempfile::PersistError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(pe: tempfile::PersistError) -> Self {
        Self::IoError(pe.error)
    }
}

impl From<ConfigError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ce: ConfigError) -> Self {
        Self::ConfigError(ce)
    }
}

// Custom formatter for debug printing

#[cfg(not(tarpaulin_include))]
pub fn opt_fmt<T: fmt::Debug>(option: &Option<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match option {
        Some(val) => val.fmt(f),
        None => write!(f, "None"),
    }
}

// Debug macros that allow to time single expressions

#[macro_export]
macro_rules! time {
    ($i:ident, $ret:ident, $exp:expr) => {
        let before = std::time::Instant::now();
        let $ret = $exp;
        let $i = before.elapsed();
    };
}
