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

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use super::wildcard::Wildcard;
use crate::support::error::Error;
use crate::support::safe_name::is_safe_name;
use crate::support::system_config::VmailConfig;

lazy_static! {
    static ref LABEL: Regex =
        Regex::new("^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap();
    static ref LOCAL_PART: Regex = Regex::new(
        r"^[a-z0-9!#$%&'*+=?^_`{|}~-]+(\.[a-z0-9!#$%&'*+=?^_`{|}~-]+)*$"
    )
    .unwrap();
    static ref QUOTA: Regex = Regex::new("^([0-9]+)([bkmgt]?)$").unwrap();
}

/// A fully-qualified domain name, in lower case.
///
/// At least two labels are required; single-label names are never valid
/// virtual domains.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainName(String);

impl DomainName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DomainName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim_end_matches('.').to_ascii_lowercase();
        if s.len() > 253
            || s.split('.').count() < 2
            || !s.split('.').all(|label| LABEL.is_match(label))
        {
            return Err(Error::InvalidDomain(s));
        }

        Ok(DomainName(s))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address, in lower case.
///
/// Addresses order by domain first so that listings group naturally.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailAddress {
    domain: DomainName,
    local: String,
}

impl EmailAddress {
    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }
}

impl FromStr for EmailAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let lower = s.trim().to_ascii_lowercase();
        let (local, domain) = match lower.rfind('@') {
            Some(at) => (&lower[..at], &lower[at + 1..]),
            None => return Err(Error::InvalidAddress(lower)),
        };

        if local.len() > 64
            || !LOCAL_PART.is_match(local)
            || local.starts_with('#')
            || local.starts_with('-')
            || !is_safe_name(local)
        {
            return Err(Error::InvalidAddress(lower.clone()));
        }

        let domain = domain
            .parse::<DomainName>()
            .map_err(|_| Error::InvalidAddress(lower.clone()))?;

        Ok(EmailAddress {
            local: local.to_owned(),
            domain,
        })
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

/// A Dovecot storage quota, e.g. `512M` or `2G`.
///
/// As in Dovecot, a number without a unit is a byte count. It is written back
/// the way it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota {
    amount: u64,
    unit: Option<char>,
}

impl FromStr for Quota {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let lower = s.trim().to_ascii_lowercase();
        let captures = QUOTA
            .captures(&lower)
            .ok_or_else(|| Error::InvalidQuota(s.to_owned()))?;
        let amount = captures[1]
            .parse::<u64>()
            .map_err(|_| Error::InvalidQuota(s.to_owned()))?;
        if 0 == amount {
            return Err(Error::InvalidQuota(s.to_owned()));
        }

        let unit = captures[2].chars().next().map(|c| c.to_ascii_uppercase());
        Ok(Quota { amount, unit })
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}{}", self.amount, unit),
            None => write!(f, "{}", self.amount),
        }
    }
}

/// The domain part of a redirect: either one literal domain or a wildcard
/// covering many.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DomainPattern {
    Literal(DomainName),
    Wildcard(Wildcard),
}

impl DomainPattern {
    pub fn matches(&self, domain: &DomainName) -> bool {
        match *self {
            DomainPattern::Literal(ref d) => d == domain,
            DomainPattern::Wildcard(ref w) => w.matches(domain),
        }
    }
}

impl FromStr for DomainPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.contains('*') {
            s.parse().map(DomainPattern::Wildcard)
        } else {
            s.parse().map(DomainPattern::Literal)
        }
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DomainPattern::Literal(ref d) => write!(f, "{}", d),
            DomainPattern::Wildcard(ref w) => write!(f, "{}", w),
        }
    }
}

/// A mailbox, as stored across the Postfix mailbox map and the Dovecot
/// passwd-file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mailbox {
    pub address: EmailAddress,
    /// The passdb hash including its `{SCHEME}` prefix.
    ///
    /// `None` if the mailbox is only known to Postfix.
    pub password_hash: Option<String>,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    /// The maildir relative to the vmail base, with a trailing `/` as Postfix
    /// requires for maildir delivery.
    pub maildir: String,
    pub quota: Option<Quota>,
    /// Extra passwd-file fields, kept verbatim. A quota rule lands here only
    /// if it could not be parsed.
    pub extra_fields: Vec<String>,
}

impl Mailbox {
    /// Create a mailbox in the standard `<base>/<domain>/<local>/` layout.
    pub fn new(
        address: EmailAddress,
        password_hash: Option<String>,
        quota: Option<Quota>,
        vmail: &VmailConfig,
    ) -> Self {
        let home = vmail
            .base
            .join(address.domain().as_str())
            .join(address.local());
        let maildir = format!("{}/{}/", address.domain(), address.local());

        Mailbox {
            address,
            password_hash,
            uid: vmail.uid,
            gid: vmail.gid,
            home,
            maildir,
            quota,
            extra_fields: Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn domain_names() {
        assert_eq!(
            "example.com",
            "Example.COM.".parse::<DomainName>().unwrap().as_str()
        );
        assert!("xn--bcher-kva.example".parse::<DomainName>().is_ok());
        assert!("a-b.c-d.example".parse::<DomainName>().is_ok());
        assert!("localhost".parse::<DomainName>().is_err());
        assert!("-a.example".parse::<DomainName>().is_err());
        assert!("a-.example".parse::<DomainName>().is_err());
        assert!("a..example".parse::<DomainName>().is_err());
        assert!("a_b.example".parse::<DomainName>().is_err());
        assert!("*.example".parse::<DomainName>().is_err());
        assert!("".parse::<DomainName>().is_err());
    }

    #[test]
    fn email_addresses() {
        let addr: EmailAddress = "Alice.Smith+tag@Example.com".parse().unwrap();
        assert_eq!("alice.smith+tag", addr.local());
        assert_eq!("example.com", addr.domain().as_str());
        assert_eq!("alice.smith+tag@example.com", addr.to_string());

        assert!("noat.example.com".parse::<EmailAddress>().is_err());
        assert!("@example.com".parse::<EmailAddress>().is_err());
        assert!(".alice@example.com".parse::<EmailAddress>().is_err());
        assert!("alice.@example.com".parse::<EmailAddress>().is_err());
        assert!("al..ice@example.com".parse::<EmailAddress>().is_err());
        assert!("a/b@example.com".parse::<EmailAddress>().is_err());
        assert!("a:b@example.com".parse::<EmailAddress>().is_err());
        assert!("#a@example.com".parse::<EmailAddress>().is_err());
        // Would read as an option to saslpasswd2
        assert!("-d@example.com".parse::<EmailAddress>().is_err());
        assert!("a-d@example.com".parse::<EmailAddress>().is_ok());
        assert!("a b@example.com".parse::<EmailAddress>().is_err());
        assert!("alice@localhost".parse::<EmailAddress>().is_err());
        assert!(format!("{}@example.com", "a".repeat(65))
            .parse::<EmailAddress>()
            .is_err());
    }

    #[test]
    fn addresses_sort_by_domain() {
        let mut addrs: Vec<EmailAddress> = vec![
            "a@z.example".parse().unwrap(),
            "z@a.example".parse().unwrap(),
            "b@a.example".parse().unwrap(),
        ];
        addrs.sort();
        assert_eq!(
            vec!["b@a.example", "z@a.example", "a@z.example"],
            addrs.iter().map(|a| a.to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn quotas() {
        let q: Quota = "512m".parse().unwrap();
        assert_eq!("512M", q.to_string());
        assert_eq!("2G", "2G".parse::<Quota>().unwrap().to_string());
        assert_eq!("100B", "100b".parse::<Quota>().unwrap().to_string());
        assert_eq!("1048576", "1048576".parse::<Quota>().unwrap().to_string());
        assert!("0G".parse::<Quota>().is_err());
        assert!("1.5G".parse::<Quota>().is_err());
        assert!("G".parse::<Quota>().is_err());
    }

    #[test]
    fn mailbox_layout() {
        let vmail = VmailConfig::default();
        let mb = Mailbox::new(
            "bob@example.com".parse().unwrap(),
            Some("{PLAIN}x".to_owned()),
            None,
            &vmail,
        );
        assert_eq!(PathBuf::from("/var/vmail/example.com/bob"), mb.home);
        assert_eq!("example.com/bob/", mb.maildir);
        assert_eq!(5000, mb.uid);
    }

    proptest! {
        #[test]
        fn generated_addresses_parse(
            local in "[a-z0-9_+][a-z0-9_+-]{0,19}(\\.[a-z0-9_+-]{1,10}){0,2}",
            domain in "[a-z0-9]{1,10}(\\.[a-z0-9]{1,10}){1,3}",
        ) {
            let s = format!("{}@{}", local, domain);
            let addr: EmailAddress = s.parse().unwrap();
            prop_assert_eq!(s, addr.to_string());
        }
    }
}
