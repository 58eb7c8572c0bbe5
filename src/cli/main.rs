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
use std::path::{Path, PathBuf};
use std::str::FromStr;

use structopt::StructOpt;

use crate::directory::model::*;
use crate::directory::service::Action;
use crate::support::error::Error;
use crate::support::external::SystemRunner;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

const CONFIG_LOCATIONS: &[&str] = &[
    "/etc/vmailadm/vmailadm.toml",
    "/usr/local/etc/vmailadm/vmailadm.toml",
];

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    /// The configuration file
    /// [default: /etc/vmailadm/vmailadm.toml or
    /// /usr/local/etc/vmailadm/vmailadm.toml, else built-in defaults]
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Also log external commands and file writes.
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Prepare a fresh installation.
    ///
    /// Creates any missing map files and the Dovecot users file, compiles the
    /// maps, points Postfix's virtual_* settings at them with `postconf -e`
    /// and reloads. Existing entries are kept.
    Init,
    /// Report inconsistencies between the Postfix maps and the Dovecot users
    /// file.
    ///
    /// Exits with EX_DATAERR if anything is found.
    Check,
    /// Show every domain, mailbox, redirect, catch-all and alias.
    List,
    /// Run an interactive menu.
    Menu,
    /// Manage main domains.
    Domain(DomainSubcommand),
    /// Manage mailboxes.
    Mailbox(MailboxSubcommand),
    /// Manage redirect domains.
    ///
    /// All mail to a redirect domain goes to one mailbox. A pattern may be a
    /// literal domain or contain `*` wildcards matching one or more
    /// characters of a host name, e.g. `*.example.org`.
    Redirect(RedirectSubcommand),
    /// Manage the catch-all address of main domains.
    CatchAll(CatchAllSubcommand),
    /// Manage aliases.
    Alias(AliasSubcommand),
}

#[derive(StructOpt)]
enum DomainSubcommand {
    /// Add a main domain, whose mail is delivered to local mailboxes.
    Add { domain: DomainName },
    /// Remove a main domain which nothing uses any more.
    Remove { domain: DomainName },
    /// List main and redirect domains.
    List,
}

#[derive(StructOpt)]
enum MailboxSubcommand {
    /// Create a mailbox.
    ///
    /// Unless --prompt-password is given, a password is generated and
    /// printed.
    Add(MailboxAddSubcommand),
    /// Delete a mailbox. Fails if anything still forwards to it.
    Remove {
        /// Also delete the maildir and everything in it.
        #[structopt(long)]
        purge: bool,
        address: EmailAddress,
    },
    /// Change the password of a mailbox.
    Passwd(MailboxPasswdSubcommand),
    /// Set the storage quota of a mailbox, e.g. `512M`, or `none`.
    Quota {
        address: EmailAddress,
        quota: QuotaSetting,
    },
}

#[derive(StructOpt)]
pub(super) struct MailboxAddSubcommand {
    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    /// Storage quota, e.g. `512M` or `2G`.
    #[structopt(long)]
    pub(super) quota: Option<Quota>,

    pub(super) address: EmailAddress,
}

#[derive(StructOpt)]
pub(super) struct MailboxPasswdSubcommand {
    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    pub(super) address: EmailAddress,
}

#[derive(StructOpt)]
enum RedirectSubcommand {
    /// Redirect all mail for PATTERN to the mailbox TARGET.
    Add {
        pattern: DomainPattern,
        target: EmailAddress,
    },
    /// Stop redirecting PATTERN.
    Remove { pattern: DomainPattern },
}

#[derive(StructOpt)]
enum CatchAllSubcommand {
    /// Send mail for unknown addresses in DOMAIN to the mailbox TARGET,
    /// replacing any existing catch-all.
    Set {
        domain: DomainName,
        target: EmailAddress,
    },
    /// Reject mail for unknown addresses in DOMAIN again.
    Remove { domain: DomainName },
}

#[derive(StructOpt)]
enum AliasSubcommand {
    /// Forward mail for ADDRESS to each TARGET.
    ///
    /// Targets in main domains must be existing mailboxes; other targets are
    /// taken as external addresses.
    Add {
        address: EmailAddress,
        #[structopt(required = true)]
        targets: Vec<EmailAddress>,
    },
    /// Remove an alias.
    Remove { address: EmailAddress },
}

/// A quota argument, where `none` removes the quota.
pub(super) struct QuotaSetting(pub(super) Option<Quota>);

impl FromStr for QuotaSetting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("none") {
            Ok(QuotaSetting(None))
        } else {
            s.parse().map(|q| QuotaSetting(Some(q)))
        }
    }
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let (config_path, config) = load_config(options.config);
    init_logging(config_path.as_deref(), options.verbose);

    let runner = SystemRunner;
    match options.command {
        Command::Init => super::admin::init(&config, &runner),
        Command::Check => super::admin::check(&config),
        Command::List => super::admin::list(&config),
        Command::Menu => super::menu::menu(&config, &runner),

        Command::Domain(DomainSubcommand::List) => {
            super::admin::list_domains(&config)
        }
        Command::Domain(DomainSubcommand::Add { domain }) => {
            super::admin::apply(&config, &runner, Action::AddDomain(domain))
        }
        Command::Domain(DomainSubcommand::Remove { domain }) => {
            super::admin::apply(&config, &runner, Action::RemoveDomain(domain))
        }

        Command::Mailbox(MailboxSubcommand::Add(cmd)) => {
            super::mailbox::add(&config, &runner, cmd)
        }
        Command::Mailbox(MailboxSubcommand::Remove { purge, address }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::RemoveMailbox { address, purge },
            )
        }
        Command::Mailbox(MailboxSubcommand::Passwd(cmd)) => {
            super::mailbox::passwd(&config, &runner, cmd)
        }
        Command::Mailbox(MailboxSubcommand::Quota { address, quota }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::SetQuota {
                    address,
                    quota: quota.0,
                },
            )
        }

        Command::Redirect(RedirectSubcommand::Add { pattern, target }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::AddRedirect { pattern, target },
            )
        }
        Command::Redirect(RedirectSubcommand::Remove { pattern }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::RemoveRedirect(pattern),
            )
        }

        Command::CatchAll(CatchAllSubcommand::Set { domain, target }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::SetCatchAll { domain, target },
            )
        }
        Command::CatchAll(CatchAllSubcommand::Remove { domain }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::RemoveCatchAll(domain),
            )
        }

        Command::Alias(AliasSubcommand::Add { address, targets }) => {
            super::admin::apply(
                &config,
                &runner,
                Action::AddAlias { address, targets },
            )
        }
        Command::Alias(AliasSubcommand::Remove { address }) => {
            super::admin::apply(&config, &runner, Action::RemoveAlias(address))
        }
    }
}

/// Find and parse the configuration, returning the path it came from.
///
/// An explicitly given file must exist; otherwise the standard locations are
/// tried and the defaults used if there is nothing there.
fn load_config(explicit: Option<PathBuf>) -> (Option<PathBuf>, SystemConfig) {
    let path = explicit.or_else(|| {
        CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    });

    let path = match path {
        Some(path) => path,
        None => return (None, SystemConfig::default()),
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => die!(EX_CONFIG, "Error reading '{}': {}", path.display(), e),
    };

    match toml::from_str(&text) {
        Ok(config) => (Some(path), config),
        Err(e) => die!(
            EX_CONFIG,
            "Error in config file at '{}': {}",
            path.display(),
            e
        ),
    }
}

fn init_logging(config_path: Option<&Path>, verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log(level);
        return;
    }

    // Run from cron or a provisioning script. log4rs and syslog are
    // alternatives since there is no maintained log4rs syslog appender.
    let log_config_file = config_path
        .and_then(Path::parent)
        .map(|dir| dir.join("logging.toml"));
    match log_config_file {
        Some(ref file) if file.is_file() => {
            log4rs::init_file(file, log4rs::file::Deserializers::new())
                .expect("Failed to initialise logging");
        }
        _ => {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_MAIL,
                hostname: None,
                process: env!("CARGO_PKG_NAME").to_owned(),
                pid: nix::unistd::getpid().as_raw(),
            };

            let logger =
                syslog::unix(formatter).expect("Failed to connect to syslog");
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                .map(|_| log::set_max_level(level))
                .expect("Failed to initialise logging");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quota_setting() {
        assert_eq!(None, "none".parse::<QuotaSetting>().unwrap().0);
        assert_eq!(None, "NONE".parse::<QuotaSetting>().unwrap().0);
        assert_eq!(
            Some("2G".to_owned()),
            "2g".parse::<QuotaSetting>().unwrap().0.map(|q| q.to_string())
        );
        assert!("lots".parse::<QuotaSetting>().is_err());
    }

    #[test]
    fn command_line_parsing() {
        let options = Options::from_iter_safe(&[
            "vmailadm",
            "--config",
            "/tmp/v.toml",
            "alias",
            "add",
            "info@example.com",
            "a@example.com",
            "b@example.net",
        ])
        .unwrap();
        assert_eq!(Some(PathBuf::from("/tmp/v.toml")), options.config);
        match options.command {
            Command::Alias(AliasSubcommand::Add { address, targets }) => {
                assert_eq!("info@example.com", address.to_string());
                assert_eq!(2, targets.len());
            }
            _ => panic!("Wrong command"),
        }

        let options = Options::from_iter_safe(&[
            "vmailadm",
            "catch-all",
            "set",
            "example.com",
            "a@example.com",
        ])
        .unwrap();
        assert!(matches!(
            options.command,
            Command::CatchAll(CatchAllSubcommand::Set { .. })
        ));

        assert!(Options::from_iter_safe(&[
            "vmailadm",
            "mailbox",
            "add",
            "not an address",
        ])
        .is_err());
        assert!(Options::from_iter_safe(&[
            "vmailadm",
            "alias",
            "add",
            "info@example.com",
        ])
        .is_err());
    }
}
