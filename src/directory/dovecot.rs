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

//! The Dovecot passwd-file user database.
//!
//! Each line is `user:password:uid:gid:gecos:home:shell:extra_fields`, where
//! the extra fields are space-separated `key=value` pairs and may themselves
//! contain colons. We only ever write the quota rule as an extra field, but
//! preserve any others found.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::warn;

use super::model::*;
use super::postfix::{parse_error, HEADER};
use super::store::Directory;
use crate::support::error::Error;
use crate::support::system_config::VmailConfig;

const QUOTA_RULE: &str = "userdb_quota_rule=*:storage=";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEntry {
    pub address: EmailAddress,
    pub password_hash: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    pub quota: Option<Quota>,
    pub extra_fields: Vec<String>,
}

/// Parse the passwd-file. Empty uid, gid or home fields take the vmail
/// defaults, as Dovecot itself would with `default_fields` set that way.
pub fn read_users(
    path: &Path,
    text: &str,
    vmail: &VmailConfig,
) -> Result<Vec<UserEntry>, Error> {
    let mut users = Vec::new();

    for (ix, raw) in text.lines().enumerate() {
        let line = ix + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields = trimmed.splitn(8, ':').collect::<Vec<_>>();
        if fields.len() < 2 {
            return Err(parse_error(path, line, "missing password field"));
        }

        let address: EmailAddress = fields[0]
            .parse()
            .map_err(|e: Error| parse_error(path, line, &e.to_string()))?;
        let password_hash = fields[1].to_owned();

        let id = |ix: usize, default: u32| -> Result<u32, Error> {
            match fields.get(ix).copied().unwrap_or_default() {
                "" => Ok(default),
                s => s.parse::<u32>().map_err(|_| {
                    parse_error(path, line, &format!("bad numeric id: {}", s))
                }),
            }
        };
        let uid = id(2, vmail.uid)?;
        let gid = id(3, vmail.gid)?;

        let home = match fields.get(5).copied().unwrap_or_default() {
            "" => Mailbox::new(address.clone(), None, None, vmail).home,
            h => PathBuf::from(h),
        };

        let mut quota = None;
        let mut extra_fields = Vec::new();
        for field in fields
            .get(7)
            .copied()
            .unwrap_or_default()
            .split_whitespace()
        {
            match field.strip_prefix(QUOTA_RULE).map(str::parse::<Quota>) {
                Some(Ok(q)) => quota = Some(q),
                Some(Err(e)) => {
                    warn!(
                        "{}:{}: {}; keeping it as is",
                        path.display(),
                        line,
                        e
                    );
                    extra_fields.push(field.to_owned());
                }
                None => extra_fields.push(field.to_owned()),
            }
        }

        users.push(UserEntry {
            address,
            password_hash,
            uid,
            gid,
            home,
            quota,
            extra_fields,
        });
    }

    Ok(users)
}

/// Render the passwd-file. Mailboxes without a password hash are omitted; an
/// empty hash read from the file is written back as it was.
pub fn render_users(dir: &Directory) -> String {
    let mut out = HEADER.to_owned();
    for mailbox in dir.mailboxes() {
        let hash = match mailbox.password_hash {
            Some(ref h) => h,
            None => continue,
        };

        let mut extra = mailbox
            .quota
            .iter()
            .map(|q| format!("{}{}", QUOTA_RULE, q))
            .collect::<Vec<_>>();
        extra.extend(
            mailbox
                .extra_fields
                .iter()
                .filter(|f| {
                    mailbox.quota.is_none() || !f.starts_with(QUOTA_RULE)
                })
                .cloned(),
        );

        let _ = writeln!(
            out,
            "{}:{}:{}:{}::{}::{}",
            mailbox.address,
            hash,
            mailbox.uid,
            mailbox.gid,
            mailbox.home.display(),
            extra.join(" "),
        );
    }
    out
}
