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

//! Mirroring of mailbox credentials into the Cyrus SASL database.
//!
//! sasldb keeps plain text credentials keyed by (realm, user), so this needs
//! the password itself rather than the Dovecot hash.

use secstr::SecUtf8;

use super::model::EmailAddress;
use crate::support::error::Error;
use crate::support::external::Runner;
use crate::support::system_config::SaslConfig;

pub fn set_password(
    config: &SaslConfig,
    runner: &dyn Runner,
    address: &EmailAddress,
    password: &SecUtf8,
) -> Result<(), Error> {
    if !config.enabled {
        return Ok(());
    }

    // -p reads the password from stdin; -c creates the entry if needed
    runner.run(
        &config.saslpasswd2,
        &[
            "-p",
            "-c",
            "-u",
            address.domain().as_str(),
            address.local(),
        ],
        Some(password.unsecure().as_bytes()),
    )?;
    Ok(())
}

pub fn delete(
    config: &SaslConfig,
    runner: &dyn Runner,
    address: &EmailAddress,
) -> Result<(), Error> {
    if !config.enabled {
        return Ok(());
    }

    runner.run(
        &config.saslpasswd2,
        &["-d", "-u", address.domain().as_str(), address.local()],
        None,
    )?;
    Ok(())
}
