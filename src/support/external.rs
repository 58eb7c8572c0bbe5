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

//! Invocation of the external mail tools (`postmap`, `postconf`, `doveadm`,
//! `saslpasswd2` and the reload commands).

use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use super::error::Error;

/// Runs external programs to completion.
pub trait Runner {
    /// Run `program` with `args`, feeding it `stdin` if given, and return its
    /// standard output.
    ///
    /// A non-zero exit status is an error carrying the program's standard
    /// error.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<String, Error>;
}

/// The `Runner` which actually spawns processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<String, Error> {
        debug!("Running {} {}", program, redact(program, args).join(" "));

        let not_run = |source| Error::CommandNotRun {
            program: program.to_owned(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(not_run)?;

        if let Some(data) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(data).map_err(not_run)?;
            }
        }

        let output = child.wait_with_output().map_err(not_run)?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: program.to_owned(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .trim()
                    .to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Hide the value following `-p` in `doveadm pw` invocations so passwords do
/// not end up in the log.
fn redact<'a>(program: &str, args: &[&'a str]) -> Vec<&'a str> {
    let mut ret = args.to_vec();
    if program.ends_with("doveadm") {
        for i in 1..ret.len() {
            if "-p" == args[i - 1] {
                ret[i] = "<redacted>";
            }
        }
    }
    ret
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn system_runner_captures_output() {
        assert_eq!(
            "hello\n",
            SystemRunner.run("echo", &["hello"], None).unwrap()
        );
        assert_eq!(
            "piped",
            SystemRunner.run("cat", &[], Some(b"piped")).unwrap()
        );
    }

    #[test]
    fn system_runner_reports_failure() {
        assert_matches!(
            Err(Error::CommandFailed { .. }),
            SystemRunner.run("false", &[], None)
        );
        assert_matches!(
            Err(Error::CommandNotRun { .. }),
            SystemRunner.run("/nonexistent/vmailadm-test", &[], None)
        );
    }

    #[test]
    fn doveadm_passwords_are_redacted() {
        assert_eq!(
            vec!["pw", "-s", "SHA512-CRYPT", "-p", "<redacted>"],
            redact("doveadm", &["pw", "-s", "SHA512-CRYPT", "-p", "hunter2"])
        );
        assert_eq!(vec!["-p", "x"], redact("postmap", &["-p", "x"]));
    }
}
