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

//! The administrative actions, each run as one transaction together with the
//! side effects outside the maps (maildirs, sasldb).

use log::info;
use secstr::SecUtf8;

use super::maildir;
use super::model::*;
use super::sasl;
use super::transaction::Transaction;
use crate::support::error::Error;
use crate::support::external::Runner;
use crate::support::password;
use crate::support::system_config::SystemConfig;

#[derive(Debug)]
pub enum Action {
    AddDomain(DomainName),
    RemoveDomain(DomainName),
    /// A `None` password means to generate one.
    AddMailbox {
        address: EmailAddress,
        password: Option<SecUtf8>,
        quota: Option<Quota>,
    },
    RemoveMailbox {
        address: EmailAddress,
        purge: bool,
    },
    SetPassword {
        address: EmailAddress,
        password: Option<SecUtf8>,
    },
    SetQuota {
        address: EmailAddress,
        quota: Option<Quota>,
    },
    AddRedirect {
        pattern: DomainPattern,
        target: EmailAddress,
    },
    RemoveRedirect(DomainPattern),
    SetCatchAll {
        domain: DomainName,
        target: EmailAddress,
    },
    RemoveCatchAll(DomainName),
    AddAlias {
        address: EmailAddress,
        targets: Vec<EmailAddress>,
    },
    RemoveAlias(EmailAddress),
}

#[derive(Debug)]
pub struct Outcome {
    /// One line describing what was done.
    pub summary: String,
    /// Set if a password was generated and must be shown to the admin.
    pub generated_password: Option<SecUtf8>,
}

impl Outcome {
    fn new(summary: String) -> Self {
        Outcome {
            summary,
            generated_password: None,
        }
    }
}

fn password_or_generate(password: Option<SecUtf8>) -> (SecUtf8, bool) {
    match password {
        Some(p) => (p, false),
        None => (password::generate(), true),
    }
}

pub fn apply(
    config: &SystemConfig,
    runner: &dyn Runner,
    action: Action,
) -> Result<Outcome, Error> {
    let mut tx = Transaction::begin(config)?;
    let dir = &mut tx.directory;

    let outcome = match action {
        Action::AddDomain(domain) => {
            let summary = format!("Added main domain {}", domain);
            dir.add_main_domain(domain)?;
            tx.commit(runner)?;
            Outcome::new(summary)
        }

        Action::RemoveDomain(domain) => {
            dir.remove_main_domain(&domain)?;
            tx.commit(runner)?;
            Outcome::new(format!("Removed main domain {}", domain))
        }

        Action::AddMailbox {
            address,
            password,
            quota,
        } => {
            let (password, generated) = password_or_generate(password);
            let hash = password::hash(&config.dovecot, runner, &password)?;
            let mailbox =
                Mailbox::new(address.clone(), Some(hash), quota, &config.vmail);
            dir.add_mailbox(mailbox.clone())?;
            tx.commit(runner)?;

            if config.vmail.create_maildirs {
                maildir::create(&config.vmail, &mailbox)?;
            }
            sasl::set_password(&config.sasl, runner, &address, &password)?;

            Outcome {
                summary: format!("Added mailbox {}", address),
                generated_password: if generated {
                    Some(password)
                } else {
                    None
                },
            }
        }

        Action::RemoveMailbox { address, purge } => {
            let mailbox = dir.remove_mailbox(&address)?;
            tx.commit(runner)?;

            sasl::delete(&config.sasl, runner, &address)?;
            if purge {
                maildir::purge(&config.vmail, &mailbox)?;
            }
            Outcome::new(format!("Removed mailbox {}", address))
        }

        Action::SetPassword { address, password } => {
            let (password, generated) = password_or_generate(password);
            let hash = password::hash(&config.dovecot, runner, &password)?;
            dir.set_password(&address, hash)?;
            tx.commit(runner)?;
            sasl::set_password(&config.sasl, runner, &address, &password)?;

            Outcome {
                summary: format!("Changed password of {}", address),
                generated_password: if generated {
                    Some(password)
                } else {
                    None
                },
            }
        }

        Action::SetQuota { address, quota } => {
            dir.set_quota(&address, quota)?;
            tx.commit(runner)?;
            Outcome::new(match quota {
                Some(q) => format!("Set quota of {} to {}", address, q),
                None => format!("Removed quota of {}", address),
            })
        }

        Action::AddRedirect { pattern, target } => {
            let summary = format!("Redirected {} to {}", pattern, target);
            dir.add_redirect_domain(pattern, target)?;
            tx.commit(runner)?;
            Outcome::new(summary)
        }

        Action::RemoveRedirect(pattern) => {
            let target = dir.remove_redirect_domain(&pattern)?;
            tx.commit(runner)?;
            Outcome::new(format!(
                "Removed redirect {} (was to {})",
                pattern, target
            ))
        }

        Action::SetCatchAll { domain, target } => {
            let summary =
                format!("Catch-all @{} now goes to {}", domain, target);
            let previous = dir.set_catch_all(domain, target)?;
            tx.commit(runner)?;
            Outcome::new(match previous {
                Some(previous) => format!("{} (was {})", summary, previous),
                None => summary,
            })
        }

        Action::RemoveCatchAll(domain) => {
            dir.remove_catch_all(&domain)?;
            tx.commit(runner)?;
            Outcome::new(format!("Removed catch-all of {}", domain))
        }

        Action::AddAlias { address, targets } => {
            dir.add_alias(address.clone(), targets)?;
            tx.commit(runner)?;
            Outcome::new(format!("Added alias {}", address))
        }

        Action::RemoveAlias(address) => {
            dir.remove_alias(&address)?;
            tx.commit(runner)?;
            Outcome::new(format!("Removed alias {}", address))
        }
    };

    info!("{}", outcome.summary);
    Ok(outcome)
}
