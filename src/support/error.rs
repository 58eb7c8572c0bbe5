//-
// Copyright (c) 2026, Jason Lingle
//
// This file is part of Vmailadm.
//
// Vmailadm is free software: you can redistribute it and/or modify it under the
// terms  of the GNU  General Public License  as published by  the Free Software
// Foundation,  either version 3  of the License,  or (at your option) any later
// version.
//
// Vmailadm  is distributed in  the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
// A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Vmailadm. If not, see <http://www.gnu.org/licenses/>.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::sysexits::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),
    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid quota: {0}")]
    InvalidQuota(String),
    #[error("{0} is already a main domain")]
    DomainExists(String),
    #[error("{0} is not a main domain")]
    DomainNotFound(String),
    #[error("{domain} is a redirect domain ({pattern})")]
    DomainIsRedirect { domain: String, pattern: String },
    #[error("{pattern} covers the main domain {domain}")]
    RedirectCoversMainDomain { pattern: String, domain: String },
    #[error("{0} is already a redirect domain")]
    RedirectExists(String),
    #[error("{0} is not a redirect domain")]
    RedirectNotFound(String),
    #[error("Domain {domain} is still in use by: {}", .users.join(", "))]
    DomainInUse { domain: String, users: Vec<String> },
    #[error("Mailbox {0} already exists")]
    MailboxExists(String),
    #[error("Mailbox {0} does not exist")]
    MailboxNotFound(String),
    #[error("Mailbox {address} is still referenced by: {}", .references.join(", "))]
    MailboxInUse {
        address: String,
        references: Vec<String>,
    },
    #[error("Alias {0} already exists")]
    AliasExists(String),
    #[error("Alias {0} does not exist")]
    AliasNotFound(String),
    #[error("Alias {0} has no targets")]
    EmptyAlias(String),
    #[error("{0} has no catch-all address")]
    CatchAllNotFound(String),
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Another vmailadm process holds {}", .0.display())]
    Locked(PathBuf),
    #[error("Unsupported password scheme: {0}")]
    UnsupportedScheme(String),
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Unable to run {program}: {source}")]
    CommandNotRun {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Nix(#[from] nix::Error),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }

    /// The process exit code appropriate for this error.
    pub fn sysexit(&self) -> Sysexit {
        match *self {
            Error::InvalidAddress(..)
            | Error::InvalidDomain(..)
            | Error::InvalidPattern(..)
            | Error::InvalidQuota(..)
            | Error::EmptyAlias(..)
            | Error::DomainExists(..)
            | Error::DomainNotFound(..)
            | Error::DomainIsRedirect { .. }
            | Error::RedirectCoversMainDomain { .. }
            | Error::RedirectExists(..)
            | Error::RedirectNotFound(..)
            | Error::DomainInUse { .. }
            | Error::MailboxExists(..)
            | Error::AliasExists(..)
            | Error::AliasNotFound(..)
            | Error::CatchAllNotFound(..)
            | Error::MailboxInUse { .. } => EX_DATAERR,

            Error::MailboxNotFound(..) => EX_NOUSER,
            Error::Parse { .. } | Error::UnsupportedScheme(..) => EX_CONFIG,
            Error::Locked(..) => EX_TEMPFAIL,
            Error::CommandFailed { .. } | Error::CommandNotRun { .. } => {
                EX_UNAVAILABLE
            }
            Error::File { .. } | Error::Io(..) => EX_IOERR,
            Error::Nix(..) => EX_OSERR,
            Error::Argon2(..) => EX_SOFTWARE,
        }
    }
}
