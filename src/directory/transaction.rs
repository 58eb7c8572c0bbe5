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

//! Loading the directory from disk and committing changes back.
//!
//! A commit renders every file from the in-memory directory, stages all of
//! them before replacing any, then compiles the hash maps and asks the
//! daemons to reload.

use std::fs;
use std::io::Write;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::dovecot;
use super::postfix::{self, PostfixMaps};
use super::store::Directory;
use crate::support::error::Error;
use crate::support::external::Runner;
use crate::support::file_ops::{self, FileLock};
use crate::support::system_config::SystemConfig;

const MAP_MODE: u32 = 0o644;
const USERS_MODE: u32 = 0o640;

/// Read the directory without taking the lock.
///
/// Each file is replaced atomically, so this sees a consistent version of
/// each, though not necessarily the same commit across all of them.
pub fn load(config: &SystemConfig) -> Result<Directory, Error> {
    let pf = &config.postfix;
    let mut maps = PostfixMaps::default();

    let path = pf.domains_path();
    postfix::read_domains(&mut maps, &path, &file_ops::slurp(&path)?)?;
    let path = pf.mailbox_path();
    postfix::read_mailboxes(&mut maps, &path, &file_ops::slurp(&path)?)?;
    let path = pf.alias_path();
    postfix::read_aliases(&mut maps, &path, &file_ops::slurp(&path)?)?;
    let path = pf.regexp_path();
    postfix::read_regexps(&mut maps, &path, &file_ops::slurp(&path)?)?;

    for declared in &maps.redirect_declarations {
        if !maps.domain_targets.iter().any(|&(ref d, _)| d == declared) {
            warn!(
                "{} is declared as a redirect domain without a target; \
                 it will be dropped on the next change",
                declared
            );
        }
    }

    let path = &config.dovecot.users_file;
    let users =
        dovecot::read_users(path, &file_ops::slurp(path)?, &config.vmail)?;

    Ok(Directory::assemble(maps, users, &config.vmail))
}

/// A locked, loaded directory waiting to be modified and committed.
///
/// Dropping a transaction without committing it discards the changes.
pub struct Transaction<'a> {
    config: &'a SystemConfig,
    lock: FileLock,
    pub directory: Directory,
}

impl<'a> Transaction<'a> {
    pub fn begin(config: &'a SystemConfig) -> Result<Self, Error> {
        let lock = FileLock::acquire(config.postfix.lock_path())?;
        debug!("Acquired {}", lock.path().display());
        let directory = load(config)?;
        Ok(Self {
            config,
            lock,
            directory,
        })
    }

    /// Write out the directory, compile the maps and reload.
    pub fn commit(self, runner: &dyn Runner) -> Result<(), Error> {
        let pf = &self.config.postfix;
        let files = vec![
            (pf.domains_path(), postfix::render_domains(&self.directory)),
            (pf.mailbox_path(), postfix::render_mailboxes(&self.directory)),
            (pf.alias_path(), postfix::render_aliases(&self.directory)),
            (pf.regexp_path(), postfix::render_regexps(&self.directory)),
            (
                self.config.dovecot.users_file.clone(),
                dovecot::render_users(&self.directory),
            ),
        ];

        let mut staged = Vec::with_capacity(files.len());
        for &(ref path, ref content) in &files {
            let default_mode = if *path == self.config.dovecot.users_file {
                USERS_MODE
            } else {
                MAP_MODE
            };
            staged.push((
                path,
                stage(path, default_mode, content.as_bytes())
                    .map_err(|e| Error::file(path, e))?,
            ));
        }

        for (path, tf) in staged {
            if self.config.backup.enabled {
                file_ops::backup(path)?;
            }
            tf.persist(path).map_err(|e| Error::file(path, e.error))?;
            debug!("Wrote {}", path.display());
        }

        compile(self.config, runner)?;
        reload(self.config, runner)?;
        info!("Committed changes under {}", pf.config_dir.display());
        drop(self.lock);
        Ok(())
    }
}

/// Write `data` to a temporary file beside `path`, carrying over the mode and
/// (when running as root) ownership of the file it will replace.
fn stage(
    path: &Path,
    default_mode: u32,
    data: &[u8],
) -> std::io::Result<tempfile::NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tf = tempfile::NamedTempFile::new_in(dir)?;
    tf.as_file_mut().write_all(data)?;

    match fs::metadata(path) {
        Ok(md) => {
            file_ops::chmod(tf.path(), md.permissions().mode() & 0o7777)?;
            if nix::unistd::geteuid().is_root() {
                nix::unistd::chown(
                    tf.path(),
                    Some(nix::unistd::Uid::from_raw(md.uid())),
                    Some(nix::unistd::Gid::from_raw(md.gid())),
                )
                .map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::Other, e)
                })?;
            }
        }
        Err(e) if std::io::ErrorKind::NotFound == e.kind() => {
            file_ops::chmod(tf.path(), default_mode)?;
        }
        Err(e) => return Err(e),
    }

    tf.as_file_mut().sync_all()?;
    Ok(tf)
}

/// The maps which `postmap` compiles. The regexp map is read as text.
fn compiled_maps(config: &SystemConfig) -> Vec<PathBuf> {
    vec![
        config.postfix.domains_path(),
        config.postfix.mailbox_path(),
        config.postfix.alias_path(),
    ]
}

pub fn compile(
    config: &SystemConfig,
    runner: &dyn Runner,
) -> Result<(), Error> {
    for path in compiled_maps(config) {
        let table = config.postfix.table(&path);
        runner.run(&config.postfix.postmap, &[&table], None)?;
    }
    Ok(())
}

pub fn reload(config: &SystemConfig, runner: &dyn Runner) -> Result<(), Error> {
    for command in &config.reload.commands {
        if let Some((program, args)) = command.split_first() {
            let args = args.iter().map(String::as_str).collect::<Vec<_>>();
            runner.run(program, &args, None)?;
        }
    }
    Ok(())
}

/// The `main.cf` settings which wire Postfix to our maps.
pub fn postconf_settings(config: &SystemConfig) -> Vec<(String, String)> {
    let pf = &config.postfix;
    let alias_maps = format!(
        "{}, regexp:{}",
        pf.table(&pf.alias_path()),
        pf.regexp_path().display()
    );

    vec![
        (
            "virtual_mailbox_domains".to_owned(),
            pf.table(&pf.domains_path()),
        ),
        (
            "virtual_mailbox_maps".to_owned(),
            pf.table(&pf.mailbox_path()),
        ),
        ("virtual_alias_maps".to_owned(), alias_maps.clone()),
        ("virtual_alias_domains".to_owned(), alias_maps),
        (
            "virtual_mailbox_base".to_owned(),
            config.vmail.base.display().to_string(),
        ),
        (
            "virtual_uid_maps".to_owned(),
            format!("static:{}", config.vmail.uid),
        ),
        (
            "virtual_gid_maps".to_owned(),
            format!("static:{}", config.vmail.gid),
        ),
    ]
}

/// Prepare a fresh installation: write every file (keeping whatever is
/// already in them), compile the maps, point Postfix at them and reload.
pub fn initialise(
    config: &SystemConfig,
    runner: &dyn Runner,
) -> Result<(), Error> {
    let tx = Transaction::begin(config)?;

    let settings = postconf_settings(config)
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>();
    let mut args = vec!["-e"];
    args.extend(settings.iter().map(String::as_str));

    // postconf first, so the reload at the end of the commit picks it up
    runner.run(&config.postfix.postconf, &args, None)?;
    tx.commit(runner)
}
