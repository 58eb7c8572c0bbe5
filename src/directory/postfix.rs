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

//! Reading and writing the Postfix text maps.
//!
//! Four files are involved:
//!
//! - The domains map (`virtual_mailbox_domains`): `domain OK`.
//!
//! - The mailbox map (`virtual_mailbox_maps`): `address domain/local/`.
//!
//! - The alias map (`virtual_alias_maps` and `virtual_alias_domains`). A bare
//!   domain key declares a redirect domain; `@domain` keys are redirect
//!   targets or catch-alls, depending on whether the domain is a main domain;
//!   full address keys are aliases, except for identity entries which exist
//!   only to keep mailboxes from being swallowed by a catch-all.
//!
//! - The regexp map, holding the wildcard redirects.

use std::fmt::Write as _;
use std::path::Path;

use super::model::*;
use super::store::Directory;
use super::wildcard::Wildcard;
use crate::support::error::Error;

pub const HEADER: &str = "# Managed by vmailadm\n";

/// One `key value` line of a Postfix table, after joining continuations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEntry {
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Parse the text form of a Postfix lookup table.
///
/// As with `postmap`, blank lines and lines whose first non-whitespace
/// character is `#` are ignored, and a line starting with whitespace
/// continues the previous entry.
pub fn parse_map(path: &Path, text: &str) -> Result<Vec<MapEntry>, Error> {
    let mut entries: Vec<MapEntry> = Vec::new();

    for (ix, raw) in text.lines().enumerate() {
        let line = ix + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if raw.starts_with(|c: char| c.is_whitespace()) {
            match entries.last_mut() {
                Some(prev) => {
                    prev.value.push(' ');
                    prev.value.push_str(trimmed);
                    continue;
                }
                None => {
                    return Err(parse_error(
                        path,
                        line,
                        "continuation line without a preceding entry",
                    ))
                }
            }
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let key = parts.next().unwrap_or_default();
        let value = parts.next().map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(parse_error(path, line, "entry has no value"));
        }

        entries.push(MapEntry {
            line,
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }

    Ok(entries)
}

pub(super) fn parse_error(path: &Path, line: usize, message: &str) -> Error {
    Error::Parse {
        path: path.to_owned(),
        line,
        message: message.to_owned(),
    }
}

fn parse_at<T: std::str::FromStr<Err = Error>>(
    path: &Path,
    line: usize,
    s: &str,
) -> Result<T, Error> {
    s.parse().map_err(|e: Error| parse_error(path, line, &e.to_string()))
}

/// Everything the Postfix maps say, before it is reconciled with Dovecot.
#[derive(Clone, Debug, Default)]
pub struct PostfixMaps {
    pub domains: Vec<DomainName>,
    /// (address, maildir)
    pub mailboxes: Vec<(EmailAddress, String)>,
    /// Bare domain keys of the alias map.
    pub redirect_declarations: Vec<DomainName>,
    /// `@domain` keys of the alias map.
    pub domain_targets: Vec<(DomainName, EmailAddress)>,
    pub wildcards: Vec<(Wildcard, EmailAddress)>,
    pub aliases: Vec<(EmailAddress, Vec<EmailAddress>)>,
}

pub fn read_domains(
    maps: &mut PostfixMaps,
    path: &Path,
    text: &str,
) -> Result<(), Error> {
    for entry in parse_map(path, text)? {
        maps.domains.push(parse_at(path, entry.line, &entry.key)?);
    }
    Ok(())
}

pub fn read_mailboxes(
    maps: &mut PostfixMaps,
    path: &Path,
    text: &str,
) -> Result<(), Error> {
    for entry in parse_map(path, text)? {
        let address = parse_at(path, entry.line, &entry.key)?;
        if entry.value.contains(char::is_whitespace) {
            return Err(parse_error(
                path,
                entry.line,
                "mailbox path contains whitespace",
            ));
        }
        maps.mailboxes.push((address, entry.value));
    }
    Ok(())
}

pub fn read_aliases(
    maps: &mut PostfixMaps,
    path: &Path,
    text: &str,
) -> Result<(), Error> {
    for entry in parse_map(path, text)? {
        let line = entry.line;
        if let Some(domain) = entry.key.strip_prefix('@') {
            let domain = parse_at(path, line, domain)?;
            let target = single_target(path, line, &entry.value)?;
            maps.domain_targets.push((domain, target));
        } else if entry.key.contains('@') {
            let address: EmailAddress = parse_at(path, line, &entry.key)?;
            let targets = entry
                .value
                .split(|c: char| ',' == c || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(|t| parse_at(path, line, t))
                .collect::<Result<Vec<EmailAddress>, Error>>()?;

            if 1 == targets.len() && address == targets[0] {
                // Identity entry, regenerated from the mailboxes
                continue;
            }
            maps.aliases.push((address, targets));
        } else {
            maps.redirect_declarations
                .push(parse_at(path, line, &entry.key)?);
        }
    }
    Ok(())
}

pub fn read_regexps(
    maps: &mut PostfixMaps,
    path: &Path,
    text: &str,
) -> Result<(), Error> {
    for entry in parse_map(path, text)? {
        let line = entry.line;
        let body = entry
            .key
            .strip_prefix('/')
            .and_then(|k| k.strip_suffix('/'))
            .ok_or_else(|| {
                parse_error(path, line, "expected a /regexp/ pattern")
            })?;
        let wildcard = Wildcard::from_postfix_regexp(body)
            .map_err(|e| parse_error(path, line, &e.to_string()))?;
        let target = single_target(path, line, &entry.value)?;
        maps.wildcards.push((wildcard, target));
    }
    Ok(())
}

fn single_target(
    path: &Path,
    line: usize,
    value: &str,
) -> Result<EmailAddress, Error> {
    if value.contains(|c: char| ',' == c || c.is_whitespace()) {
        return Err(parse_error(path, line, "expected a single target"));
    }
    parse_at(path, line, value)
}

pub fn render_domains(dir: &Directory) -> String {
    let mut out = HEADER.to_owned();
    for domain in dir.main_domains() {
        let _ = writeln!(out, "{}\tOK", domain);
    }
    out
}

pub fn render_mailboxes(dir: &Directory) -> String {
    let mut out = HEADER.to_owned();
    for mailbox in dir.mailboxes() {
        let _ = writeln!(out, "{}\t{}", mailbox.address, mailbox.maildir);
    }
    out
}

pub fn render_aliases(dir: &Directory) -> String {
    let mut out = HEADER.to_owned();

    let literal_redirects = dir
        .redirects()
        .filter_map(|(pattern, target)| match *pattern {
            DomainPattern::Literal(ref d) => Some((d, target)),
            DomainPattern::Wildcard(..) => None,
        })
        .collect::<Vec<_>>();

    if !literal_redirects.is_empty() {
        out.push_str("\n# Redirect domains\n");
        for &(domain, target) in &literal_redirects {
            let _ = writeln!(out, "{}\tredirect", domain);
            let _ = writeln!(out, "@{}\t{}", domain, target);
        }
    }

    for (domain, target) in dir.catch_alls() {
        let _ = writeln!(out, "\n# Catch-all for {}", domain);
        for mailbox in dir.mailboxes_in(domain) {
            let _ = writeln!(out, "{0}\t{0}", mailbox.address);
        }
        let _ = writeln!(out, "@{}\t{}", domain, target);
    }

    let mut first = true;
    for (address, targets) in dir.aliases() {
        if std::mem::take(&mut first) {
            out.push_str("\n# Aliases\n");
        }
        let targets = targets
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{}\t{}", address, targets);
    }

    out
}

pub fn render_regexps(dir: &Directory) -> String {
    let mut out = HEADER.to_owned();
    for (pattern, target) in dir.redirects() {
        if let DomainPattern::Wildcard(ref w) = *pattern {
            let _ = writeln!(out, "# {}", w);
            let _ = writeln!(out, "/{}/\t{}", w.postfix_regexp(), target);
        }
    }
    out
}
