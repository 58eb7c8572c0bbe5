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

//! Wildcard domain patterns and their translation to Postfix `regexp:`
//! tables.
//!
//! In a pattern, `*` stands for one or more characters which may appear in a
//! host name: letters, digits, hyphens and dots. So `*.example.org` covers
//! `a.example.org` and `a.b.example.org` but not `example.org` itself.
//!
//! The Postfix regexp generated for a pattern matches both the bare domain
//! (which is how `virtual_alias_domains` is queried) and any address at it
//! (which is how `virtual_alias_maps` is queried).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use super::model::DomainName;
use crate::support::error::Error;

const STAR_REGEX: &str = "[a-z0-9.-]+";
const ADDRESS_PREFIX: &str = "^(.+@)?";

#[derive(Clone, Debug)]
pub struct Wildcard {
    pattern: String,
    regex: Regex,
}

impl Wildcard {
    pub fn matches(&self, domain: &DomainName) -> bool {
        self.regex.is_match(domain.as_str())
    }

    /// The body of the Postfix regexp, without delimiters.
    pub fn postfix_regexp(&self) -> String {
        format!("{}{}$", ADDRESS_PREFIX, translate(&self.pattern))
    }

    /// Recover the wildcard from a Postfix regexp body produced by
    /// `postfix_regexp`.
    pub fn from_postfix_regexp(body: &str) -> Result<Self, Error> {
        let bad = || Error::InvalidPattern(body.to_owned());
        let mut rest = body
            .strip_prefix(ADDRESS_PREFIX)
            .and_then(|b| b.strip_suffix('$'))
            .ok_or_else(bad)?;

        let mut pattern = String::new();
        while !rest.is_empty() {
            if let Some(r) = rest.strip_prefix(STAR_REGEX) {
                pattern.push('*');
                rest = r;
            } else if let Some(r) = rest.strip_prefix("\\.") {
                pattern.push('.');
                rest = r;
            } else {
                let c = rest.chars().next().ok_or_else(bad)?;
                if !c.is_ascii_lowercase() && !c.is_ascii_digit() && '-' != c
                {
                    return Err(bad());
                }
                pattern.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }

        pattern.parse()
    }
}

fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(STAR_REGEX),
            '.' => out.push_str("\\."),
            c => out.push(c),
        }
    }
    out
}

impl FromStr for Wildcard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let pattern = s.trim_end_matches('.').to_ascii_lowercase();
        let bad = || Error::InvalidPattern(pattern.clone());

        let last_star = pattern.rfind('*').ok_or_else(bad)?;
        if pattern.contains("**") {
            return Err(bad());
        }

        // Everything must be a valid domain once the stars are filled in, and
        // the part after the last star must leave at least a registrable
        // domain (so `*.org` is rejected).
        pattern
            .replace('*', "x")
            .parse::<DomainName>()
            .map_err(|_| bad())?;
        let suffix = &pattern[last_star + 1..];
        match suffix.find('.') {
            Some(dot) => {
                suffix[dot + 1..]
                    .parse::<DomainName>()
                    .map_err(|_| bad())?;
            }
            None => return Err(bad()),
        }

        let regex = Regex::new(&format!("^{}$", translate(&pattern)))
            .map_err(|_| bad())?;
        Ok(Wildcard { pattern, regex })
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for Wildcard {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Wildcard {}

impl PartialOrd for Wildcard {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Wildcard {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pattern.cmp(&other.pattern)
    }
}
