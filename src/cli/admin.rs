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

//! Commands which print the directory, and the common handling of actions.

use std::io::{self, Write};

use crate::directory::model::DomainPattern;
use crate::directory::service::{self, Action, Outcome};
use crate::directory::store::{Directory, Finding};
use crate::directory::transaction;
use crate::support::error::Error;
use crate::support::external::Runner;
use crate::support::system_config::SystemConfig;

/// Report `err` and exit with the matching status.
pub(super) fn fail(err: Error) -> ! {
    eprintln!("{}", err);
    err.sysexit().exit()
}

fn load(config: &SystemConfig) -> Directory {
    transaction::load(config).unwrap_or_else(|e| fail(e))
}

fn output(result: io::Result<()>) {
    if let Err(e) = result {
        die!(EX_IOERR, "Error writing output: {}", e);
    }
}

/// Run `action`, printing the password if one was generated.
///
/// The summary itself goes to the log.
pub(super) fn apply(
    config: &SystemConfig,
    runner: &dyn Runner,
    action: Action,
) {
    match service::apply(config, runner, action) {
        Ok(Outcome {
            generated_password: Some(password),
            ..
        }) => println!("Password: {}", password.unsecure()),
        Ok(_) => (),
        Err(e) => fail(e),
    }
}

pub(super) fn init(config: &SystemConfig, runner: &dyn Runner) {
    if let Err(e) = transaction::initialise(config, runner) {
        fail(e);
    }
}

pub(super) fn check(config: &SystemConfig) {
    let findings = load(config).check();
    output(write_findings(&mut io::stdout(), &findings));
    if !findings.is_empty() {
        die!(EX_DATAERR, "{} problem(s) found", findings.len());
    }
}

pub(super) fn list(config: &SystemConfig) {
    output(write_listing(&mut io::stdout(), &load(config)));
}

pub(super) fn list_domains(config: &SystemConfig) {
    output(write_domains(&mut io::stdout(), &load(config)));
}

pub(super) fn write_findings(
    out: &mut dyn Write,
    findings: &[Finding],
) -> io::Result<()> {
    if findings.is_empty() {
        writeln!(out, "No problems found.")?;
    }
    for finding in findings {
        writeln!(out, "{}", finding)?;
    }
    Ok(())
}

pub(super) fn write_domains(
    out: &mut dyn Write,
    dir: &Directory,
) -> io::Result<()> {
    for domain in dir.main_domains() {
        writeln!(out, "{}", domain)?;
    }
    for (pattern, target) in dir.redirects() {
        writeln!(out, "{} (redirect to {})", pattern, target)?;
    }
    Ok(())
}

pub(super) fn write_listing(
    out: &mut dyn Write,
    dir: &Directory,
) -> io::Result<()> {
    writeln!(out, "Main domains:")?;
    for domain in dir.main_domains() {
        match dir.catch_all(domain) {
            Some(target) => {
                writeln!(out, "  {} (catch-all to {})", domain, target)?
            }
            None => writeln!(out, "  {}", domain)?,
        }
    }

    writeln!(out, "Mailboxes:")?;
    for mailbox in dir.mailboxes() {
        match mailbox.quota {
            Some(quota) => {
                writeln!(out, "  {} (quota {})", mailbox.address, quota)?
            }
            None => writeln!(out, "  {}", mailbox.address)?,
        }
    }

    writeln!(out, "Redirect domains:")?;
    for (pattern, target) in dir.redirects() {
        let kind = match *pattern {
            DomainPattern::Literal(..) => "",
            DomainPattern::Wildcard(..) => " (wildcard)",
        };
        writeln!(out, "  {}{} -> {}", pattern, kind, target)?;
    }

    writeln!(out, "Aliases:")?;
    for (address, targets) in dir.aliases() {
        let targets = targets
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "  {} -> {}", address, targets)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::directory::model::*;
    use crate::support::system_config::VmailConfig;

    fn sample() -> Directory {
        let vmail = VmailConfig::default();
        let mut dir = Directory::default();
        dir.add_main_domain("example.com".parse().unwrap()).unwrap();
        let mut mailbox = Mailbox::new(
            "alice@example.com".parse().unwrap(),
            Some("{PLAIN}x".to_owned()),
            None,
            &vmail,
        );
        mailbox.quota = Some("1G".parse().unwrap());
        dir.add_mailbox(mailbox).unwrap();
        dir.add_redirect_domain(
            "*.example.org".parse().unwrap(),
            "alice@example.com".parse().unwrap(),
        )
        .unwrap();
        dir.set_catch_all(
            "example.com".parse().unwrap(),
            "alice@example.com".parse().unwrap(),
        )
        .unwrap();
        dir.add_alias(
            "info@example.com".parse().unwrap(),
            vec![
                "alice@example.com".parse().unwrap(),
                "boss@example.net".parse().unwrap(),
            ],
        )
        .unwrap();
        dir
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn listing() {
        let dir = sample();
        assert_eq!(
            "Main domains:\n  \
             example.com (catch-all to alice@example.com)\n\
             Mailboxes:\n  \
             alice@example.com (quota 1G)\n\
             Redirect domains:\n  \
             *.example.org (wildcard) -> alice@example.com\n\
             Aliases:\n  \
             info@example.com -> alice@example.com, boss@example.net\n",
            render(|out| write_listing(out, &dir))
        );
    }

    #[test]
    fn domains() {
        let dir = sample();
        assert_eq!(
            "example.com\n*.example.org (redirect to alice@example.com)\n",
            render(|out| write_domains(out, &dir))
        );
    }

    #[test]
    fn findings() {
        assert_eq!(
            "No problems found.\n",
            render(|out| write_findings(out, &[]))
        );
        assert_eq!(
            "mailbox bob@example.com has no Dovecot user entry\n",
            render(|out| write_findings(
                out,
                &[Finding::NoCredentials("bob@example.com".parse().unwrap())]
            ))
        );
    }
}
