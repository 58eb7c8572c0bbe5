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

//! The in-memory virtual mail directory.
//!
//! Every mutation checks the referential-integrity rules before changing
//! anything, so a failed operation leaves the directory as it was.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::dovecot::UserEntry;
use super::model::*;
use super::postfix::PostfixMaps;
use crate::support::error::Error;
use crate::support::system_config::VmailConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    main_domains: BTreeSet<DomainName>,
    mailboxes: BTreeMap<EmailAddress, Mailbox>,
    redirects: BTreeMap<DomainPattern, EmailAddress>,
    catch_alls: BTreeMap<DomainName, EmailAddress>,
    aliases: BTreeMap<EmailAddress, Vec<EmailAddress>>,
}

/// A problem found by `Directory::check`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finding {
    /// The mailbox is in the Postfix mailbox map but has no Dovecot entry,
    /// so it receives mail nobody can read.
    NoCredentials(EmailAddress),
    /// The mailbox's domain is not a main domain, so Postfix rejects its mail.
    OrphanMailbox(EmailAddress),
    /// `source` forwards to a local address which is not a mailbox.
    DanglingTarget {
        source: String,
        target: EmailAddress,
    },
    /// A domain is both a main domain and covered by a redirect.
    DomainConflict {
        domain: DomainName,
        pattern: DomainPattern,
    },
    /// An alias has the same address as a mailbox and shadows it.
    AliasShadowsMailbox(EmailAddress),
    /// The Dovecot entry has an empty password field, so nobody can log in.
    EmptyPassword(EmailAddress),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Finding::NoCredentials(ref a) => {
                write!(f, "mailbox {} has no Dovecot user entry", a)
            }
            Finding::OrphanMailbox(ref a) => write!(
                f,
                "mailbox {} belongs to {}, which is not a main domain",
                a,
                a.domain()
            ),
            Finding::DanglingTarget {
                ref source,
                ref target,
            } => write!(
                f,
                "{} forwards to {}, which is not a mailbox",
                source, target
            ),
            Finding::DomainConflict {
                ref domain,
                ref pattern,
            } => write!(
                f,
                "{} is a main domain but also covered by redirect {}",
                domain, pattern
            ),
            Finding::AliasShadowsMailbox(ref a) => {
                write!(f, "alias {} shadows the mailbox of the same name", a)
            }
            Finding::EmptyPassword(ref a) => {
                write!(f, "mailbox {} has an empty password field", a)
            }
        }
    }
}

impl Directory {
    /// Reconcile what Postfix and Dovecot say into one directory.
    ///
    /// This does not enforce the integrity rules, since the files may have
    /// been edited by hand; `check` reports whatever is wrong.
    pub fn assemble(
        maps: PostfixMaps,
        users: Vec<UserEntry>,
        vmail: &VmailConfig,
    ) -> Self {
        let mut dir = Directory::default();
        dir.main_domains.extend(maps.domains);

        for (address, maildir) in maps.mailboxes {
            let mut mailbox = Mailbox::new(address.clone(), None, None, vmail);
            mailbox.maildir = maildir;
            dir.mailboxes.insert(address, mailbox);
        }

        for user in users {
            let vmail_default =
                Mailbox::new(user.address.clone(), None, None, vmail);
            let mailbox = dir
                .mailboxes
                .entry(user.address.clone())
                .or_insert(vmail_default);
            mailbox.password_hash = Some(user.password_hash);
            mailbox.uid = user.uid;
            mailbox.gid = user.gid;
            mailbox.home = user.home;
            mailbox.quota = user.quota;
            mailbox.extra_fields = user.extra_fields;
        }

        for (domain, target) in maps.domain_targets {
            // A main domain declared as a redirect stays a redirect so that
            // `check` can report the conflict.
            if dir.main_domains.contains(&domain)
                && !maps.redirect_declarations.contains(&domain)
            {
                dir.catch_alls.insert(domain, target);
            } else {
                dir.redirects.insert(DomainPattern::Literal(domain), target);
            }
        }

        for (wildcard, target) in maps.wildcards {
            dir.redirects.insert(DomainPattern::Wildcard(wildcard), target);
        }

        dir.aliases.extend(maps.aliases);
        dir
    }

    pub fn main_domains(&self) -> impl Iterator<Item = &DomainName> {
        self.main_domains.iter()
    }

    pub fn mailboxes(&self) -> impl Iterator<Item = &Mailbox> {
        self.mailboxes.values()
    }

    pub fn mailboxes_in<'a>(
        &'a self,
        domain: &'a DomainName,
    ) -> impl Iterator<Item = &'a Mailbox> + 'a {
        self.mailboxes
            .values()
            .filter(move |m| m.address.domain() == domain)
    }

    pub fn mailbox(&self, address: &EmailAddress) -> Option<&Mailbox> {
        self.mailboxes.get(address)
    }

    pub fn redirects(
        &self,
    ) -> impl Iterator<Item = (&DomainPattern, &EmailAddress)> {
        self.redirects.iter()
    }

    pub fn catch_alls(
        &self,
    ) -> impl Iterator<Item = (&DomainName, &EmailAddress)> {
        self.catch_alls.iter()
    }

    pub fn catch_all(&self, domain: &DomainName) -> Option<&EmailAddress> {
        self.catch_alls.get(domain)
    }

    pub fn aliases(
        &self,
    ) -> impl Iterator<Item = (&EmailAddress, &Vec<EmailAddress>)> {
        self.aliases.iter()
    }

    pub fn is_main_domain(&self, domain: &DomainName) -> bool {
        self.main_domains.contains(domain)
    }

    fn redirect_covering(&self, domain: &DomainName) -> Option<&DomainPattern> {
        self.redirects.keys().find(|p| p.matches(domain))
    }

    fn require_mailbox(&self, address: &EmailAddress) -> Result<(), Error> {
        if self.mailboxes.contains_key(address) {
            Ok(())
        } else {
            Err(Error::MailboxNotFound(address.to_string()))
        }
    }

    pub fn add_main_domain(&mut self, domain: DomainName) -> Result<(), Error> {
        if self.main_domains.contains(&domain) {
            return Err(Error::DomainExists(domain.to_string()));
        }

        if let Some(pattern) = self.redirect_covering(&domain) {
            return Err(Error::DomainIsRedirect {
                domain: domain.to_string(),
                pattern: pattern.to_string(),
            });
        }

        self.main_domains.insert(domain);
        Ok(())
    }

    pub fn remove_main_domain(
        &mut self,
        domain: &DomainName,
    ) -> Result<(), Error> {
        if !self.main_domains.contains(domain) {
            return Err(Error::DomainNotFound(domain.to_string()));
        }

        let mut users = self
            .mailboxes_in(domain)
            .map(|m| format!("mailbox {}", m.address))
            .collect::<Vec<_>>();
        users.extend(
            self.aliases
                .keys()
                .filter(|a| a.domain() == domain)
                .map(|a| format!("alias {}", a)),
        );
        if self.catch_alls.contains_key(domain) {
            users.push(format!("catch-all @{}", domain));
        }

        if !users.is_empty() {
            return Err(Error::DomainInUse {
                domain: domain.to_string(),
                users,
            });
        }

        self.main_domains.remove(domain);
        Ok(())
    }

    pub fn add_mailbox(&mut self, mailbox: Mailbox) -> Result<(), Error> {
        let address = &mailbox.address;
        if !self.main_domains.contains(address.domain()) {
            return Err(Error::DomainNotFound(address.domain().to_string()));
        }
        if self.mailboxes.contains_key(address) {
            return Err(Error::MailboxExists(address.to_string()));
        }
        if self.aliases.contains_key(address) {
            return Err(Error::AliasExists(address.to_string()));
        }

        self.mailboxes.insert(address.clone(), mailbox);
        Ok(())
    }

    /// Describe everything which forwards mail to `address`.
    ///
    /// Comparison is exact, so `bob@example.com` is not considered referenced
    /// by a forward to `jimbob@example.com`.
    pub fn references_to(&self, address: &EmailAddress) -> Vec<String> {
        let mut refs = Vec::new();
        for (pattern, target) in &self.redirects {
            if target == address {
                refs.push(format!("redirect {}", pattern));
            }
        }
        for (domain, target) in &self.catch_alls {
            if target == address {
                refs.push(format!("catch-all @{}", domain));
            }
        }
        for (alias, targets) in &self.aliases {
            if targets.contains(address) {
                refs.push(format!("alias {}", alias));
            }
        }
        refs
    }

    pub fn remove_mailbox(
        &mut self,
        address: &EmailAddress,
    ) -> Result<Mailbox, Error> {
        self.require_mailbox(address)?;

        let references = self.references_to(address);
        if !references.is_empty() {
            return Err(Error::MailboxInUse {
                address: address.to_string(),
                references,
            });
        }

        self.mailboxes
            .remove(address)
            .ok_or_else(|| Error::MailboxNotFound(address.to_string()))
    }

    pub fn set_password(
        &mut self,
        address: &EmailAddress,
        password_hash: String,
    ) -> Result<(), Error> {
        let mailbox = self
            .mailboxes
            .get_mut(address)
            .ok_or_else(|| Error::MailboxNotFound(address.to_string()))?;
        mailbox.password_hash = Some(password_hash);
        Ok(())
    }

    pub fn set_quota(
        &mut self,
        address: &EmailAddress,
        quota: Option<Quota>,
    ) -> Result<(), Error> {
        let mailbox = self
            .mailboxes
            .get_mut(address)
            .ok_or_else(|| Error::MailboxNotFound(address.to_string()))?;
        mailbox.quota = quota;
        Ok(())
    }

    pub fn add_redirect_domain(
        &mut self,
        pattern: DomainPattern,
        target: EmailAddress,
    ) -> Result<(), Error> {
        if let Some(domain) =
            self.main_domains.iter().find(|d| pattern.matches(d))
        {
            return Err(Error::RedirectCoversMainDomain {
                pattern: pattern.to_string(),
                domain: domain.to_string(),
            });
        }
        if self.redirects.contains_key(&pattern) {
            return Err(Error::RedirectExists(pattern.to_string()));
        }
        self.require_mailbox(&target)?;

        self.redirects.insert(pattern, target);
        Ok(())
    }

    pub fn remove_redirect_domain(
        &mut self,
        pattern: &DomainPattern,
    ) -> Result<EmailAddress, Error> {
        self.redirects
            .remove(pattern)
            .ok_or_else(|| Error::RedirectNotFound(pattern.to_string()))
    }

    /// Point the catch-all of `domain` at `target`, returning the previous
    /// target if there was one.
    pub fn set_catch_all(
        &mut self,
        domain: DomainName,
        target: EmailAddress,
    ) -> Result<Option<EmailAddress>, Error> {
        if !self.main_domains.contains(&domain) {
            return Err(Error::DomainNotFound(domain.to_string()));
        }
        self.require_mailbox(&target)?;

        Ok(self.catch_alls.insert(domain, target))
    }

    pub fn remove_catch_all(
        &mut self,
        domain: &DomainName,
    ) -> Result<EmailAddress, Error> {
        self.catch_alls
            .remove(domain)
            .ok_or_else(|| Error::CatchAllNotFound(domain.to_string()))
    }

    pub fn add_alias(
        &mut self,
        address: EmailAddress,
        targets: Vec<EmailAddress>,
    ) -> Result<(), Error> {
        if !self.main_domains.contains(address.domain()) {
            return Err(Error::DomainNotFound(address.domain().to_string()));
        }
        if self.mailboxes.contains_key(&address) {
            return Err(Error::MailboxExists(address.to_string()));
        }
        if self.aliases.contains_key(&address) {
            return Err(Error::AliasExists(address.to_string()));
        }

        let mut deduped = Vec::with_capacity(targets.len());
        for target in targets {
            if !deduped.contains(&target) {
                deduped.push(target);
            }
        }
        if deduped.is_empty() {
            return Err(Error::EmptyAlias(address.to_string()));
        }

        for target in &deduped {
            if self.main_domains.contains(target.domain()) {
                self.require_mailbox(target)?;
            }
        }

        self.aliases.insert(address, deduped);
        Ok(())
    }

    pub fn remove_alias(
        &mut self,
        address: &EmailAddress,
    ) -> Result<Vec<EmailAddress>, Error> {
        self.aliases
            .remove(address)
            .ok_or_else(|| Error::AliasNotFound(address.to_string()))
    }

    /// Find every inconsistency in the directory.
    pub fn check(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        for mailbox in self.mailboxes.values() {
            match mailbox.password_hash.as_deref() {
                None => findings
                    .push(Finding::NoCredentials(mailbox.address.clone())),
                Some("") => findings
                    .push(Finding::EmptyPassword(mailbox.address.clone())),
                Some(_) => (),
            }
            if !self.main_domains.contains(mailbox.address.domain()) {
                findings.push(Finding::OrphanMailbox(mailbox.address.clone()));
            }
        }

        for domain in &self.main_domains {
            if let Some(pattern) = self.redirect_covering(domain) {
                findings.push(Finding::DomainConflict {
                    domain: domain.clone(),
                    pattern: pattern.clone(),
                });
            }
        }

        let mut dangling = |source: String, target: &EmailAddress| {
            if !self.mailboxes.contains_key(target) {
                findings.push(Finding::DanglingTarget {
                    source,
                    target: target.clone(),
                });
            }
        };

        for (pattern, target) in &self.redirects {
            dangling(format!("redirect {}", pattern), target);
        }
        for (domain, target) in &self.catch_alls {
            dangling(format!("catch-all @{}", domain), target);
        }
        for (alias, targets) in &self.aliases {
            for target in targets {
                if self.main_domains.contains(target.domain()) {
                    dangling(format!("alias {}", alias), target);
                }
            }
        }

        for alias in self.aliases.keys() {
            if self.mailboxes.contains_key(alias) {
                findings.push(Finding::AliasShadowsMailbox(alias.clone()));
            }
        }

        findings
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(s: &str) -> EmailAddress {
        s.parse().unwrap()
    }

    fn domain(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    fn pattern(s: &str) -> DomainPattern {
        s.parse().unwrap()
    }

    fn mailbox(s: &str) -> Mailbox {
        Mailbox::new(
            addr(s),
            Some("{PLAIN}x".to_owned()),
            None,
            &VmailConfig::default(),
        )
    }

    fn sample() -> Directory {
        let mut dir = Directory::default();
        dir.add_main_domain(domain("example.com")).unwrap();
        dir.add_mailbox(mailbox("alice@example.com")).unwrap();
        dir.add_mailbox(mailbox("bob@example.com")).unwrap();
        dir
    }

    #[test]
    fn main_domain_lifecycle() {
        let mut dir = sample();
        assert_matches!(
            Err(Error::DomainExists(_)),
            dir.add_main_domain(domain("example.com"))
        );

        assert_matches!(
            Err(Error::DomainInUse { .. }),
            dir.remove_main_domain(&domain("example.com"))
        );

        dir.add_main_domain(domain("other.example")).unwrap();
        dir.remove_main_domain(&domain("other.example")).unwrap();
        assert_matches!(
            Err(Error::DomainNotFound(_)),
            dir.remove_main_domain(&domain("other.example"))
        );
    }

    #[test]
    fn domain_in_use_lists_everything() {
        let mut dir = sample();
        dir.add_alias(addr("info@example.com"), vec![addr("bob@example.com")])
            .unwrap();
        dir.set_catch_all(domain("example.com"), addr("alice@example.com"))
            .unwrap();

        match dir.remove_main_domain(&domain("example.com")) {
            Err(Error::DomainInUse { users, .. }) => assert_eq!(
                vec![
                    "mailbox alice@example.com",
                    "mailbox bob@example.com",
                    "alias info@example.com",
                    "catch-all @example.com",
                ],
                users
            ),
            r => panic!("Unexpected result: {:?}", r),
        }
    }

    #[test]
    fn main_and_redirect_domains_are_exclusive() {
        let mut dir = sample();
        dir.add_redirect_domain(
            pattern("example.org"),
            addr("alice@example.com"),
        )
        .unwrap();
        dir.add_redirect_domain(
            pattern("*.example.net"),
            addr("alice@example.com"),
        )
        .unwrap();

        assert_matches!(
            Err(Error::DomainIsRedirect { .. }),
            dir.add_main_domain(domain("example.org"))
        );
        assert_matches!(
            Err(Error::DomainIsRedirect { .. }),
            dir.add_main_domain(domain("mx.example.net"))
        );
        dir.add_main_domain(domain("example.net")).unwrap();

        assert_matches!(
            Err(Error::RedirectCoversMainDomain { .. }),
            dir.add_redirect_domain(
                pattern("example.com"),
                addr("alice@example.com")
            )
        );
        dir.add_main_domain(domain("mail.example.info")).unwrap();
        assert_matches!(
            Err(Error::RedirectCoversMainDomain { .. }),
            dir.add_redirect_domain(
                pattern("*.example.info"),
                addr("alice@example.com")
            )
        );
        assert_matches!(
            Err(Error::RedirectExists(_)),
            dir.add_redirect_domain(
                pattern("example.org"),
                addr("bob@example.com")
            )
        );
    }

    #[test]
    fn redirect_target_must_be_mailbox() {
        let mut dir = sample();
        assert_matches!(
            Err(Error::MailboxNotFound(_)),
            dir.add_redirect_domain(
                pattern("example.org"),
                addr("carol@example.com")
            )
        );
        assert_eq!(0, dir.redirects().count());
    }

    #[test]
    fn mailbox_requires_main_domain_and_unique_address() {
        let mut dir = sample();
        assert_matches!(
            Err(Error::DomainNotFound(_)),
            dir.add_mailbox(mailbox("alice@example.org"))
        );
        assert_matches!(
            Err(Error::MailboxExists(_)),
            dir.add_mailbox(mailbox("alice@example.com"))
        );

        dir.add_alias(addr("info@example.com"), vec![addr("bob@example.com")])
            .unwrap();
        assert_matches!(
            Err(Error::AliasExists(_)),
            dir.add_mailbox(mailbox("info@example.com"))
        );
    }

    #[test]
    fn referenced_mailbox_cannot_be_removed() {
        let mut dir = sample();
        dir.add_redirect_domain(pattern("example.org"), addr("bob@example.com"))
            .unwrap();
        dir.set_catch_all(domain("example.com"), addr("bob@example.com"))
            .unwrap();
        dir.add_alias(
            addr("sales@example.com"),
            vec![addr("bob@example.com"), addr("ext@partner.example")],
        )
        .unwrap();

        let before = dir.clone();
        match dir.remove_mailbox(&addr("bob@example.com")) {
            Err(Error::MailboxInUse { references, .. }) => assert_eq!(
                vec![
                    "redirect example.org",
                    "catch-all @example.com",
                    "alias sales@example.com",
                ],
                references
            ),
            r => panic!("Unexpected result: {:?}", r),
        }
        assert_eq!(before, dir);
    }

    #[test]
    fn references_are_exact() {
        let mut dir = sample();
        dir.add_mailbox(mailbox("jimbob@example.com")).unwrap();
        dir.add_redirect_domain(
            pattern("example.org"),
            addr("jimbob@example.com"),
        )
        .unwrap();

        // A substring match would consider bob@ referenced by jimbob@
        let removed = dir.remove_mailbox(&addr("bob@example.com")).unwrap();
        assert_eq!(addr("bob@example.com"), removed.address);
        assert!(dir.mailbox(&addr("bob@example.com")).is_none());
    }

    #[test]
    fn catch_all_replacement() {
        let mut dir = sample();
        assert_eq!(
            None,
            dir.set_catch_all(domain("example.com"), addr("alice@example.com"))
                .unwrap()
        );
        assert_eq!(
            Some(addr("alice@example.com")),
            dir.set_catch_all(domain("example.com"), addr("bob@example.com"))
                .unwrap()
        );
        assert_matches!(
            Err(Error::DomainNotFound(_)),
            dir.set_catch_all(domain("example.org"), addr("bob@example.com"))
        );
        assert_eq!(
            addr("bob@example.com"),
            dir.remove_catch_all(&domain("example.com")).unwrap()
        );
        assert_matches!(
            Err(Error::CatchAllNotFound(_)),
            dir.remove_catch_all(&domain("example.com"))
        );
    }

    #[test]
    fn alias_targets() {
        let mut dir = sample();
        assert_matches!(
            Err(Error::MailboxNotFound(_)),
            dir.add_alias(
                addr("info@example.com"),
                vec![addr("nobody@example.com")]
            )
        );
        assert_matches!(
            Err(Error::EmptyAlias(_)),
            dir.add_alias(addr("info@example.com"), vec![])
        );
        assert_matches!(
            Err(Error::MailboxExists(_)),
            dir.add_alias(
                addr("alice@example.com"),
                vec![addr("bob@example.com")]
            )
        );

        dir.add_alias(
            addr("info@example.com"),
            vec![
                addr("bob@example.com"),
                addr("x@remote.example"),
                addr("bob@example.com"),
            ],
        )
        .unwrap();
        assert_eq!(
            vec![addr("bob@example.com"), addr("x@remote.example")],
            dir.remove_alias(&addr("info@example.com")).unwrap()
        );
    }

    #[test]
    fn assembly_and_check() {
        let vmail = VmailConfig::default();
        let maps = PostfixMaps {
            domains: vec![domain("example.com"), domain("example.org")],
            mailboxes: vec![
                (addr("alice@example.com"), "example.com/alice/".to_owned()),
                (addr("ghost@example.com"), "example.com/ghost/".to_owned()),
                (addr("stray@gone.example"), "gone.example/stray/".to_owned()),
            ],
            redirect_declarations: vec![],
            domain_targets: vec![
                (domain("example.com"), addr("alice@example.com")),
                (domain("example.net"), addr("nobody@example.com")),
            ],
            wildcards: vec![(
                "*.example.org".parse().unwrap(),
                addr("alice@example.com"),
            )],
            aliases: vec![(
                addr("alice@example.com"),
                vec![addr("elsewhere@remote.example")],
            )],
        };
        let users = vec![
            UserEntry {
                address: addr("alice@example.com"),
                password_hash: "{PLAIN}a".to_owned(),
                uid: 1,
                gid: 2,
                home: "/home/alice".into(),
                quota: Some("1G".parse().unwrap()),
                extra_fields: vec![],
            },
            UserEntry {
                address: addr("stray@gone.example"),
                password_hash: "{PLAIN}s".to_owned(),
                uid: 1,
                gid: 2,
                home: "/home/stray".into(),
                quota: None,
                extra_fields: vec![],
            },
        ];

        let dir = Directory::assemble(maps, users, &vmail);
        let alice = dir.mailbox(&addr("alice@example.com")).unwrap();
        assert_eq!(Some("{PLAIN}a".to_owned()), alice.password_hash);
        assert_eq!(1, alice.uid);
        assert_eq!("example.com/alice/", alice.maildir);
        assert_eq!(
            Some(&addr("alice@example.com")),
            dir.catch_all(&domain("example.com"))
        );
        assert_eq!(2, dir.redirects().count());

        let findings = dir.check();
        assert_eq!(
            vec![
                Finding::NoCredentials(addr("ghost@example.com")),
                Finding::OrphanMailbox(addr("stray@gone.example")),
                Finding::DanglingTarget {
                    source: "redirect example.net".to_owned(),
                    target: addr("nobody@example.com"),
                },
                Finding::AliasShadowsMailbox(addr("alice@example.com")),
            ],
            findings
        );
    }

    #[test]
    fn wildcard_conflict_is_found() {
        let mut dir = Directory::default();
        dir.redirects.insert(pattern("*.example.org"), addr("a@example.org"));
        dir.main_domains.insert(domain("mx.example.org"));

        let findings = dir.check();
        assert!(findings.contains(&Finding::DomainConflict {
            domain: domain("mx.example.org"),
            pattern: pattern("*.example.org"),
        }));
    }

    #[test]
    fn redirect_declared_on_main_domain_is_kept() {
        let maps = PostfixMaps {
            domains: vec![domain("example.com")],
            redirect_declarations: vec![domain("example.com")],
            domain_targets: vec![(
                domain("example.com"),
                addr("someone@remote.example"),
            )],
            ..PostfixMaps::default()
        };

        let dir = Directory::assemble(maps, vec![], &VmailConfig::default());
        assert_eq!(None, dir.catch_all(&domain("example.com")));
        assert_eq!(
            vec![Finding::DomainConflict {
                domain: domain("example.com"),
                pattern: pattern("example.com"),
            }],
            dir.check()
        );
    }

    #[test]
    fn empty_password_is_found() {
        let vmail = VmailConfig::default();
        let mut dir = Directory::default();
        dir.main_domains.insert(domain("example.com"));
        dir.mailboxes.insert(
            addr("a@example.com"),
            Mailbox::new(
                addr("a@example.com"),
                Some(String::new()),
                None,
                &vmail,
            ),
        );

        assert_eq!(
            vec![Finding::EmptyPassword(addr("a@example.com"))],
            dir.check()
        );
    }
}
