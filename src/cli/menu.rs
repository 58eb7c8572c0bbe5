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

//! The interactive menu.
//!
//! Every action is its own transaction, exactly as if the corresponding
//! subcommand had been run. An empty answer goes back to the menu; end of
//! input quits.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use secstr::SecUtf8;

use super::admin;
use super::main::QuotaSetting;
use crate::directory::model::*;
use crate::directory::service::{self, Action};
use crate::directory::transaction;
use crate::support::error::Error;
use crate::support::external::Runner;
use crate::support::system_config::SystemConfig;

const ENTRIES: &[&str] = &[
    "List everything",
    "Add main domain",
    "Remove main domain",
    "Add mailbox",
    "Remove mailbox",
    "Change password",
    "Set quota",
    "Add redirect domain",
    "Remove redirect domain",
    "Set catch-all",
    "Remove catch-all",
    "Add alias",
    "Remove alias",
    "Check consistency",
];

pub(super) fn menu(config: &SystemConfig, runner: &dyn Runner) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu {
        config,
        runner,
        input: stdin.lock(),
        output: stdout.lock(),
        read_password: rpassword::prompt_password_stderr,
    };

    if let Err(e) = menu.run() {
        die!(EX_IOERR, "I/O error: {}", e);
    }
}

/// A comma-separated list of addresses.
struct AddressList(Vec<EmailAddress>);

impl FromStr for AddressList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        s.split(|c: char| ',' == c || c.is_whitespace())
            .filter(|a| !a.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(AddressList)
    }
}

/// Read an answer or go back to the menu.
macro_rules! ask {
    ($self:ident, $prompt:expr) => {
        match $self.ask($prompt)? {
            Some(answer) => answer,
            None => return Ok(None),
        }
    };
}

struct Menu<'a, R, W> {
    config: &'a SystemConfig,
    runner: &'a dyn Runner,
    input: R,
    output: W,
    read_password: fn(&str) -> io::Result<String>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            for (ix, entry) in ENTRIES.iter().enumerate() {
                writeln!(self.output, "{:>2}) {}", ix + 1, entry)?;
            }
            writeln!(self.output, " 0) Quit")?;

            let choice = match self.ask::<usize>("Choice")? {
                None | Some(0) => return Ok(()),
                Some(choice) => choice,
            };

            match choice {
                1 => match transaction::load(self.config) {
                    Ok(dir) => admin::write_listing(&mut self.output, &dir)?,
                    Err(e) => writeln!(self.output, "Error: {}", e)?,
                },

                14 => match transaction::load(self.config) {
                    Ok(dir) => {
                        admin::write_findings(&mut self.output, &dir.check())?
                    }
                    Err(e) => writeln!(self.output, "Error: {}", e)?,
                },

                choice if choice <= ENTRIES.len() => {
                    if let Some(action) = self.prompt_action(choice)? {
                        self.perform(action)?;
                    }
                }

                _ => writeln!(self.output, "No such choice")?,
            }
        }
    }

    fn prompt_action(&mut self, choice: usize) -> io::Result<Option<Action>> {
        let action = match choice {
            2 => Action::AddDomain(ask!(self, "Domain")),
            3 => Action::RemoveDomain(ask!(self, "Domain")),
            4 => {
                let address = ask!(self, "Address");
                let quota: QuotaSetting =
                    ask!(self, "Quota (e.g. 512M, or none)");
                let password = match self.prompt_password()? {
                    Some(password) => password,
                    None => return Ok(None),
                };
                Action::AddMailbox {
                    address,
                    password,
                    quota: quota.0,
                }
            }
            5 => {
                let address = ask!(self, "Address");
                let purge =
                    match self.confirm("Also delete the maildir?", false)? {
                        Some(purge) => purge,
                        None => return Ok(None),
                    };
                Action::RemoveMailbox { address, purge }
            }
            6 => {
                let address = ask!(self, "Address");
                let password = match self.prompt_password()? {
                    Some(password) => password,
                    None => return Ok(None),
                };
                Action::SetPassword { address, password }
            }
            7 => {
                let address = ask!(self, "Address");
                let quota: QuotaSetting =
                    ask!(self, "Quota (e.g. 512M, or none)");
                Action::SetQuota {
                    address,
                    quota: quota.0,
                }
            }
            8 => Action::AddRedirect {
                pattern: ask!(self, "Domain or pattern (e.g. *.example.org)"),
                target: ask!(self, "Target mailbox"),
            },
            9 => Action::RemoveRedirect(ask!(self, "Domain or pattern")),
            10 => Action::SetCatchAll {
                domain: ask!(self, "Domain"),
                target: ask!(self, "Target mailbox"),
            },
            11 => Action::RemoveCatchAll(ask!(self, "Domain")),
            12 => {
                let address = ask!(self, "Alias address");
                let targets: AddressList =
                    ask!(self, "Targets (separated by commas)");
                Action::AddAlias {
                    address,
                    targets: targets.0,
                }
            }
            13 => Action::RemoveAlias(ask!(self, "Alias address")),
            _ => return Ok(None),
        };

        Ok(Some(action))
    }

    fn perform(&mut self, action: Action) -> io::Result<()> {
        match service::apply(self.config, self.runner, action) {
            Ok(outcome) => {
                writeln!(self.output, "{}", outcome.summary)?;
                if let Some(password) = outcome.generated_password {
                    writeln!(self.output, "Password: {}", password.unsecure())?;
                }
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(())
    }

    /// Read one line, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if 0 == self.input.read_line(&mut line)? {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Ask until the answer parses. An empty answer gives `None`.
    fn ask<T>(&mut self, prompt: &str) -> io::Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        loop {
            let line = match self.read_line(prompt)? {
                Some(line) if !line.is_empty() => line,
                _ => return Ok(None),
            };

            match line.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    fn confirm(
        &mut self,
        prompt: &str,
        default: bool,
    ) -> io::Result<Option<bool>> {
        let prompt = format!(
            "{} [{}]",
            prompt,
            if default { "Y/n" } else { "y/N" }
        );
        loop {
            let line = match self.read_line(&prompt)? {
                Some(line) => line.to_ascii_lowercase(),
                None => return Ok(None),
            };

            match line.as_str() {
                "" => return Ok(Some(default)),
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n")?,
            }
        }
    }

    /// Returns `Some(None)` to generate a password and `None` to go back to
    /// the menu.
    fn prompt_password(&mut self) -> io::Result<Option<Option<SecUtf8>>> {
        match self.confirm("Generate a password?", true)? {
            None => return Ok(None),
            Some(true) => return Ok(Some(None)),
            Some(false) => (),
        }

        let a = (self.read_password)("Password: ")?;
        let b = (self.read_password)("Confirm: ")?;
        if a != b {
            writeln!(self.output, "Passwords don't match")?;
            Ok(None)
        } else if a.is_empty() {
            writeln!(self.output, "No password given")?;
            Ok(None)
        } else {
            Ok(Some(Some(SecUtf8::from(a))))
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::support::external::test_runner::RecordingRunner;

    fn fixed_password(_: &str) -> io::Result<String> {
        Ok("correct horse".to_owned())
    }

    fn config(root: &TempDir) -> SystemConfig {
        let mut config = SystemConfig::default();
        config.postfix.config_dir = root.path().join("postfix");
        config.dovecot.users_file = root.path().join("users");
        config.vmail.base = root.path().join("vmail");
        config.vmail.create_maildirs = false;
        fs::create_dir(&config.postfix.config_dir).unwrap();
        config
    }

    fn run_menu(config: &SystemConfig, input: &str) -> String {
        let runner = RecordingRunner::default();
        let mut output = Vec::new();
        Menu {
            config,
            runner: &runner,
            input: input.as_bytes(),
            output: &mut output,
            read_password: fixed_password,
        }
        .run()
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn add_domain_mailbox_and_alias() {
        crate::init_test_log();
        let root = TempDir::new().unwrap();
        let config = config(&root);

        let output = run_menu(
            &config,
            "2\nnot a domain\nexample.com\n\
             4\nalice@example.com\n1G\nn\n\
             4\nbob@example.com\nnone\n\n\
             12\ninfo@example.com\nalice@example.com, bob@example.com\n\
             1\n\
             0\n",
        );

        assert!(output.contains("Invalid domain name: not a domain"));
        assert!(output.contains("Added main domain example.com\n"));
        assert!(output.contains("Added mailbox alice@example.com\n"));
        assert!(output.contains("Added mailbox bob@example.com\nPassword: "));
        assert!(output.contains("Added alias info@example.com\n"));
        assert!(output.contains("  alice@example.com (quota 1G)\n"));
        assert!(output.contains(
            "  info@example.com -> alice@example.com, bob@example.com\n"
        ));

        let dir = transaction::load(&config).unwrap();
        assert_eq!(2, dir.mailboxes().count());
        assert!(dir.check().is_empty());
    }

    #[test]
    fn errors_return_to_the_menu() {
        let root = TempDir::new().unwrap();
        let config = config(&root);

        let output = run_menu(
            &config,
            "3\nexample.com\n\
             99\n\
             5\n\n\
             14\n",
        );

        assert!(output.contains("Error: example.com is not a main domain\n"));
        assert!(output.contains("No such choice\n"));
        assert!(output.contains("No problems found.\n"));
        // End of input quits without complaint
        assert!(output.ends_with("Choice: \n"));
    }

    #[test]
    fn address_lists() {
        let list = "a@example.com,b@example.com  c@example.net"
            .parse::<AddressList>()
            .unwrap();
        assert_eq!(3, list.0.len());
        assert!("a@example.com, nonsense".parse::<AddressList>().is_err());
    }
}
