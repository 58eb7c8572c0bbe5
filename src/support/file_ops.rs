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

//! Miscellaneous functions for working with files.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;

use crate::support::error::Error;

/// Read the whole file at `path` as UTF-8. A missing file reads as empty.
pub fn slurp(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .ignore_not_found()
        .map_err(|e| Error::file(path, e))
}

/// Copy `path` to `<path>.bak`, if `path` exists.
pub fn backup(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let mut bak = path.as_os_str().to_owned();
    bak.push(".bak");

    match fs::copy(path, &bak) {
        Ok(_) => {
            debug!("Backed up {} to {:?}", path.display(), bak);
            Ok(())
        }
        Err(e) if io::ErrorKind::NotFound == e.kind() => Ok(()),
        Err(e) => Err(Error::file(path, e)),
    }
}

pub fn chmod(path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// An exclusive advisory lock, held until dropped.
///
/// The lock file itself is never removed; only the `flock` on it matters.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    _file: fs::File,
}

impl FileLock {
    /// Take the lock without blocking, failing with `Error::Locked` if
    /// another process holds it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_owned();
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::file(&path, e))?;

        match nix::fcntl::flock(
            file.as_raw_fd(),
            nix::fcntl::FlockArg::LockExclusiveNonblock,
        ) {
            Ok(()) => Ok(Self { path, _file: file }),
            Err(nix::Error::Sys(nix::errno::Errno::EAGAIN)) => {
                Err(Error::Locked(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub trait IgnoreKinds {
    fn ignore_already_exists(self) -> Self;
    fn ignore_not_found(self) -> Self;
}

impl<R: Default> IgnoreKinds for Result<R, io::Error> {
    fn ignore_already_exists(self) -> Self {
        match self {
            Ok(r) => Ok(r),
            Err(e) if io::ErrorKind::AlreadyExists == e.kind() => {
                Ok(R::default())
            }
            Err(e) => Err(e),
        }
    }

    fn ignore_not_found(self) -> Self {
        match self {
            Ok(r) => Ok(r),
            Err(e) if io::ErrorKind::NotFound == e.kind() => Ok(R::default()),
            Err(e) => Err(e),
        }
    }
}
