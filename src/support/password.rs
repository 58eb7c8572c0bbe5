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

//! Password generation and hashing in the forms Dovecot accepts.

use rand::{rngs::OsRng, Rng};
use secstr::SecUtf8;

use super::error::Error;
use super::external::Runner;
use super::system_config::DovecotConfig;

/// Generate a random password suitable for handing to a user.
pub fn generate() -> SecUtf8 {
    let data: [u8; 12] = OsRng.gen();
    SecUtf8::from(base64::encode(data))
}

/// Hash `password` with the configured scheme, returning the string as it
/// appears in the second field of the passwd-file, i.e. including the
/// `{SCHEME}` prefix.
pub fn hash(
    config: &DovecotConfig,
    runner: &dyn Runner,
    password: &SecUtf8,
) -> Result<String, Error> {
    let scheme = config.password_scheme.to_ascii_uppercase();
    match &*scheme {
        "ARGON2I" => hash_argon2(
            &scheme,
            password,
            argon2::Variant::Argon2i,
            // libsodium's "interactive" limits for Argon2i
            32768,
            4,
        ),
        "ARGON2ID" => hash_argon2(
            &scheme,
            password,
            argon2::Variant::Argon2id,
            65536,
            2,
        ),
        _ => hash_with_doveadm(config, runner, &scheme, password),
    }
}

fn hash_argon2(
    scheme: &str,
    password: &SecUtf8,
    variant: argon2::Variant,
    mem_cost: u32,
    time_cost: u32,
) -> Result<String, Error> {
    let salt: [u8; 16] = OsRng.gen();
    // Dovecot verifies through libsodium, which only supports one lane.
    let encoded = argon2::hash_encoded(
        password.unsecure().as_bytes(),
        &salt,
        &argon2::Config {
            hash_length: 32,
            lanes: 1,
            mem_cost,
            thread_mode: argon2::ThreadMode::Sequential,
            time_cost,
            variant,
            version: argon2::Version::Version13,
            ..argon2::Config::default()
        },
    )?;

    Ok(format!("{{{}}}{}", scheme, encoded))
}

fn hash_with_doveadm(
    config: &DovecotConfig,
    runner: &dyn Runner,
    scheme: &str,
    password: &SecUtf8,
) -> Result<String, Error> {
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || '-' == c || '.' == c)
    {
        return Err(Error::UnsupportedScheme(scheme.to_owned()));
    }

    let output = runner.run(
        &config.doveadm,
        &["pw", "-s", scheme, "-p", password.unsecure()],
        None,
    )?;
    let hash = output.trim();

    if !hash.starts_with('{') || hash.contains(':') || hash.contains('\n') {
        return Err(Error::CommandFailed {
            program: config.doveadm.clone(),
            status: "unexpected output".to_owned(),
            stderr: hash.to_owned(),
        });
    }

    Ok(hash.to_owned())
}
