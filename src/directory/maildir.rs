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

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Component, Path, PathBuf};

use log::info;

use super::model::Mailbox;
use crate::support::error::Error;
use crate::support::file_ops::IgnoreKinds;
use crate::support::system_config::VmailConfig;

/// Resolve the maildir of `mailbox` under the vmail base, refusing anything
/// that would escape it.
fn resolve(vmail: &VmailConfig, mailbox: &Mailbox) -> Result<PathBuf, Error> {
    let relative = Path::new(&mailbox.maildir);
    if relative.components().count() == 0
        || !relative
            .components()
            .all(|c| matches!(c, Component::Normal(..)))
    {
        return Err(Error::InvalidAddress(format!(
            "{} (maildir {})",
            mailbox.address, mailbox.maildir
        )));
    }

    Ok(vmail.base.join(relative))
}

/// Create the maildir (with `cur`, `new` and `tmp`) for `mailbox`.
///
/// Existing directories are left alone. When running as root, everything
/// created is handed to the mailbox's uid and gid.
pub fn create(vmail: &VmailConfig, mailbox: &Mailbox) -> Result<(), Error> {
    let root = resolve(vmail, mailbox)?;

    let mut to_chown = Vec::new();
    if let Some(domain_dir) = root.parent() {
        if !domain_dir.is_dir() {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o750)
                .create(domain_dir)
                .map_err(|e| Error::file(domain_dir, e))?;
            to_chown.push(domain_dir.to_owned());
        }
    }

    for sub in &["", "cur", "new", "tmp"] {
        let dir = root.join(sub);
        let created = fs::DirBuilder::new()
            .mode(0o700)
            .create(&dir)
            .map(|_| true)
            .ignore_already_exists()
            .map_err(|e| Error::file(&dir, e))?;
        if created {
            to_chown.push(dir);
        }
    }

    if nix::unistd::geteuid().is_root() {
        for dir in &to_chown {
            nix::unistd::chown(
                dir,
                Some(nix::unistd::Uid::from_raw(mailbox.uid)),
                Some(nix::unistd::Gid::from_raw(mailbox.gid)),
            )?;
        }
    }

    info!("Created maildir {}", root.display());
    Ok(())
}

/// Delete the maildir of `mailbox` and everything in it.
pub fn purge(vmail: &VmailConfig, mailbox: &Mailbox) -> Result<(), Error> {
    let root = resolve(vmail, mailbox)?;
    fs::remove_dir_all(&root)
        .ignore_not_found()
        .map_err(|e| Error::file(&root, e))?;
    info!("Deleted maildir {}", root.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, VmailConfig, Mailbox) {
        let dir = TempDir::new().unwrap();
        let vmail = VmailConfig {
            base: dir.path().to_owned(),
            ..VmailConfig::default()
        };
        let mailbox = Mailbox::new(
            "alice@example.com".parse().unwrap(),
            None,
            None,
            &vmail,
        );
        (dir, vmail, mailbox)
    }

    #[test]
    fn create_then_purge() {
        let (dir, vmail, mailbox) = setup();

        create(&vmail, &mailbox).unwrap();
        for sub in &["cur", "new", "tmp"] {
            assert!(dir.path().join("example.com/alice").join(sub).is_dir());
        }
        // Idempotent
        create(&vmail, &mailbox).unwrap();

        purge(&vmail, &mailbox).unwrap();
        assert!(!dir.path().join("example.com/alice").exists());
        assert!(dir.path().join("example.com").is_dir());
        purge(&vmail, &mailbox).unwrap();
    }

    #[test]
    fn escaping_maildirs_are_refused() {
        let (_dir, vmail, mut mailbox) = setup();
        mailbox.maildir = "../etc/".to_owned();
        assert_matches!(Err(Error::InvalidAddress(_)), purge(&vmail, &mailbox));
        mailbox.maildir = "/etc/".to_owned();
        assert_matches!(
            Err(Error::InvalidAddress(_)),
            create(&vmail, &mailbox)
        );
        mailbox.maildir = String::new();
        assert_matches!(Err(Error::InvalidAddress(_)), purge(&vmail, &mailbox));
    }
}
