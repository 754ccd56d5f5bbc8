//! Fatal, non-diagnosable failures (spec §7: "Invariant violations inside
//! the core ... are treated as programmer errors and fail fast"; everything
//! else is a [`crate::diagnostics::Diagnostic`], not an `Err`).

use std::fmt;

/// Reserved for conditions a grammar author cannot fix by editing their
/// grammar: I/O failure reading an import, or a malformed binary blob
/// handed to [`crate::format::load_from_bytes`]. Ordinary grammar-authoring
/// mistakes never produce a `Fatal` — they become diagnostics instead, so
/// `Grammar::build` always returns a (possibly not-for-parsing) grammar.
#[derive(Debug)]
pub enum Fatal {
  Io(std::io::Error),
  MalformedArtifact(String),
  VersionTooOld { found_major: u16, found_minor: u16 },
  VersionTooNew { found_major: u16, found_minor: u16, supported_major: u16 },
}

impl fmt::Display for Fatal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Fatal::Io(err) => write!(f, "i/o error: {err}"),
      Fatal::MalformedArtifact(msg) => write!(f, "malformed grammar artifact: {msg}"),
      Fatal::VersionTooOld { found_major, found_minor } => {
        write!(f, "grammar artifact version {found_major}.{found_minor} predates this format and must be converted")
      }
      Fatal::VersionTooNew { found_major, found_minor, supported_major } => write!(
        f,
        "grammar artifact version {found_major}.{found_minor} is newer than the supported major version {supported_major}"
      ),
    }
  }
}

impl std::error::Error for Fatal {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Fatal::Io(err) => Some(err),
      _ => None,
    }
  }
}

impl From<std::io::Error> for Fatal {
  fn from(err: std::io::Error) -> Self {
    Fatal::Io(err)
  }
}

pub type BuildResult<T> = Result<T, Fatal>;
