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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The system-wide configuration for vmailadm.
///
/// This is stored in a file named `vmailadm.toml`, which is typically under
/// `/etc/vmailadm` or `/usr/local/etc/vmailadm`. Every field has a default
/// matching a stock Debian Postfix/Dovecot installation.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SystemConfig {
    pub postfix: PostfixConfig,
    pub dovecot: DovecotConfig,
    pub vmail: VmailConfig,
    pub sasl: SaslConfig,
    pub reload: ReloadConfig,
    pub backup: BackupConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PostfixConfig {
    /// The directory holding `main.cf` and the virtual maps.
    pub config_dir: PathBuf,
    /// The Postfix lookup table type used for the compiled maps, e.g. `hash`
    /// or `lmdb`.
    pub map_type: String,
    /// File name (under `config_dir`) of the `virtual_mailbox_domains` map.
    pub domains_map: String,
    /// File name of the `virtual_mailbox_maps` map.
    pub mailbox_map: String,
    /// File name of the literal `virtual_alias_maps` map.
    pub alias_map: String,
    /// File name of the `regexp:` alias map holding wildcard redirects.
    pub regexp_map: String,
    pub postmap: String,
    pub postconf: String,
}

impl Default for PostfixConfig {
    fn default() -> Self {
        Self {
            config_dir: "/etc/postfix".into(),
            map_type: "hash".to_owned(),
            domains_map: "virtual_domains".to_owned(),
            mailbox_map: "vmailbox".to_owned(),
            alias_map: "virtual".to_owned(),
            regexp_map: "virtual_regexp".to_owned(),
            postmap: "postmap".to_owned(),
            postconf: "postconf".to_owned(),
        }
    }
}

impl PostfixConfig {
    pub fn domains_path(&self) -> PathBuf {
        self.config_dir.join(&self.domains_map)
    }

    pub fn mailbox_path(&self) -> PathBuf {
        self.config_dir.join(&self.mailbox_map)
    }

    pub fn alias_path(&self) -> PathBuf {
        self.config_dir.join(&self.alias_map)
    }

    pub fn regexp_path(&self) -> PathBuf {
        self.config_dir.join(&self.regexp_map)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.config_dir.join(".vmailadm.lock")
    }

    /// The `type:path` table reference Postfix and `postmap` expect for the
    /// given compiled map.
    pub fn table(&self, path: &std::path::Path) -> String {
        format!("{}:{}", self.map_type, path.display())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DovecotConfig {
    /// The passwd-file used as both passdb and userdb.
    pub users_file: PathBuf,
    /// The Dovecot password scheme for new hashes.
    ///
    /// `ARGON2I` and `ARGON2ID` are computed internally. Anything else is
    /// delegated to `doveadm pw`.
    pub password_scheme: String,
    pub doveadm: String,
}

impl Default for DovecotConfig {
    fn default() -> Self {
        Self {
            users_file: "/etc/dovecot/users".into(),
            password_scheme: "ARGON2ID".to_owned(),
            doveadm: "doveadm".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct VmailConfig {
    /// `virtual_mailbox_base`; maildirs live at `<base>/<domain>/<local>/`.
    pub base: PathBuf,
    /// The UNIX user and group owning every virtual mailbox.
    pub uid: u32,
    pub gid: u32,
    /// If true, `mailbox add` creates the maildir immediately instead of
    /// leaving it to the first delivery.
    pub create_maildirs: bool,
}

impl Default for VmailConfig {
    fn default() -> Self {
        Self {
            base: "/var/vmail".into(),
            uid: 5000,
            gid: 5000,
            create_maildirs: true,
        }
    }
}

/// Mirroring of mailbox credentials into the Cyrus SASL database, for
/// installations where Postfix authenticates through `saslauthd`/sasldb
/// instead of Dovecot.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SaslConfig {
    pub enabled: bool,
    pub saslpasswd2: String,
}

impl Default for SaslConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            saslpasswd2: "saslpasswd2".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Commands run after every successful commit, each as program followed
    /// by arguments. Dovecot reads its passwd-file on every lookup so it
    /// usually needs no entry here.
    pub commands: Vec<Vec<String>>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            commands: vec![vec!["postfix".to_owned(), "reload".to_owned()]],
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BackupConfig {
    /// If true, the previous version of each file is kept as `<file>.bak`.
    pub enabled: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: SystemConfig = toml::from_str(
            r#"
[postfix]
map_type = "lmdb"

[vmail]
uid = 2000
gid = 2000

[reload]
commands = [["systemctl", "reload", "postfix"]]
"#,
        )
        .unwrap();

        assert_eq!("lmdb", config.postfix.map_type);
        assert_eq!("vmailbox", config.postfix.mailbox_map);
        assert_eq!(2000, config.vmail.uid);
        assert_eq!(PathBuf::from("/var/vmail"), config.vmail.base);
        assert_eq!(
            vec![vec![
                "systemctl".to_owned(),
                "reload".to_owned(),
                "postfix".to_owned()
            ]],
            config.reload.commands
        );
        assert!(config.backup.enabled);
        assert!(!config.sasl.enabled);
        assert_eq!(
            "lmdb:/etc/postfix/vmailbox",
            config.postfix.table(&config.postfix.mailbox_path())
        );
    }

    #[test]
    fn empty_config_is_default() {
        let config: SystemConfig = toml::from_str("").unwrap();
        assert_eq!("ARGON2ID", config.dovecot.password_scheme);
        assert_eq!(
            PathBuf::from("/etc/dovecot/users"),
            config.dovecot.users_file
        );
        assert_eq!(
            PathBuf::from("/etc/postfix/.vmailadm.lock"),
            config.postfix.lock_path()
        );
    }
}
