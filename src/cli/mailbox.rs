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

use secstr::SecUtf8;

use super::admin;
use super::main::{MailboxAddSubcommand, MailboxPasswdSubcommand};
use crate::directory::service::Action;
use crate::support::external::Runner;
use crate::support::system_config::SystemConfig;

pub(super) fn add(
    config: &SystemConfig,
    runner: &dyn Runner,
    cmd: MailboxAddSubcommand,
) {
    let password = if cmd.prompt_password {
        Some(read_password())
    } else {
        None
    };

    admin::apply(
        config,
        runner,
        Action::AddMailbox {
            address: cmd.address,
            password,
            quota: cmd.quota,
        },
    );
}

pub(super) fn passwd(
    config: &SystemConfig,
    runner: &dyn Runner,
    cmd: MailboxPasswdSubcommand,
) {
    let password = if cmd.prompt_password {
        Some(read_password())
    } else {
        None
    };

    admin::apply(
        config,
        runner,
        Action::SetPassword {
            address: cmd.address,
            password,
        },
    );
}

/// Read a new password and its confirmation from the terminal.
fn read_password() -> SecUtf8 {
    match rpassword::prompt_password_stderr("Password: ").and_then(|a| {
        rpassword::prompt_password_stderr("Confirm: ").map(|b| (a, b))
    }) {
        Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
        Ok((a, b)) if a != b => die!(EX_DATAERR, "Passwords don't match"),
        Ok((a, _)) if a.is_empty() => die!(EX_NOINPUT, "No password given"),
        Ok((a, _)) => SecUtf8::from(a),
    }
}
