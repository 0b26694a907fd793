//! Remote host access over the system `ssh` and `scp` clients
//!
//! Host keys are not verified: the hosts are freshly provisioned private-net
//! machines listed in the layout file. Password auth is delegated to
//! `sshpass`; key and agent auth run with `BatchMode=yes` so a missing
//! credential fails instead of prompting.

use crate::core::error::{Result, TrondError};
use crate::core::process;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Connect timeout for the `echo ok` probe.
pub const PROBE_TIMEOUT_SECS: u64 = 5;
/// Connect timeout for mkdir and file transfers.
pub const TRANSFER_TIMEOUT_SECS: u64 = 10;
/// Connect timeout for remote docker-compose runs.
pub const COMPOSE_TIMEOUT_SECS: u64 = 15;

/// How to authenticate against a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Key(PathBuf),
    Password(String),
    Agent,
}

impl Auth {
    /// Pick a method: key first, then password, then a running agent.
    ///
    /// `agent_sock` is the value of `SSH_AUTH_SOCK`, if any.
    pub fn select(
        host: &str,
        key: Option<&str>,
        password: Option<&str>,
        agent_sock: Option<&OsStr>,
    ) -> Result<Self> {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            return Ok(Auth::Key(expand_home(key)));
        }
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            return Ok(Auth::Password(pw.to_string()));
        }
        if agent_sock.is_some_and(|s| !s.is_empty()) {
            return Ok(Auth::Agent);
        }
        Err(TrondError::NoAuthMethod(host.to_string()))
    }

    /// Short label for status output. Never includes the password.
    pub fn describe(&self) -> String {
        match self {
            Auth::Key(path) => format!("SSH Key ({})", path.display()),
            Auth::Password(_) => "Password".to_string(),
            Auth::Agent => "SSH Agent".to_string(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Quote a string for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// One remote host.
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: Auth,
}

impl SshTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn options(&self, timeout_secs: u64) -> Vec<String> {
        let mut opts = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", timeout_secs),
        ];
        match &self.auth {
            Auth::Key(path) => {
                opts.push("-o".to_string());
                opts.push("BatchMode=yes".to_string());
                opts.push("-i".to_string());
                opts.push(path.display().to_string());
            }
            Auth::Agent => {
                opts.push("-o".to_string());
                opts.push("BatchMode=yes".to_string());
            }
            Auth::Password(_) => {}
        }
        opts
    }

    /// Wrap a client invocation in `sshpass` when using a password.
    fn wrap(&self, client: &str, args: Vec<String>) -> (String, Vec<String>) {
        match &self.auth {
            Auth::Password(pw) => {
                let mut full = vec!["-p".to_string(), pw.clone(), client.to_string()];
                full.extend(args);
                ("sshpass".to_string(), full)
            }
            _ => (client.to_string(), args),
        }
    }

    /// Program and arguments for running `remote_cmd` on the host.
    pub fn ssh_command(&self, timeout_secs: u64, remote_cmd: &str) -> (String, Vec<String>) {
        let mut args = self.options(timeout_secs);
        args.push("-p".to_string());
        args.push(self.port.to_string());
        args.push(self.destination());
        args.push(remote_cmd.to_string());
        self.wrap("ssh", args)
    }

    /// Program and arguments for copying `local` to `remote` on the host.
    pub fn scp_command(&self, timeout_secs: u64, local: &Path, remote: &str) -> (String, Vec<String>) {
        let mut args = self.options(timeout_secs);
        args.push("-P".to_string());
        args.push(self.port.to_string());
        args.push(local.display().to_string());
        args.push(format!("{}:{}", self.destination(), remote));
        self.wrap("scp", args)
    }

    fn exec(&self, (program, args): (String, Vec<String>), what: String) -> Result<String> {
        if program == "sshpass" {
            process::require_tool("sshpass")?;
        }
        let (ok, output) = process::run_combined(&program, &args)?;
        if !ok {
            // `what` stands in for the command line so passwords stay out of errors.
            return Err(TrondError::CommandFailedWithOutput {
                cmd: what,
                output: output.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run a shell command on the host and return its combined output.
    pub fn run(&self, timeout_secs: u64, remote_cmd: &str) -> Result<String> {
        self.exec(
            self.ssh_command(timeout_secs, remote_cmd),
            format!("ssh {} -p {} {}", self.destination(), self.port, remote_cmd),
        )
    }

    /// Probe the connection with `echo ok`.
    pub fn check(&self) -> Result<()> {
        let output = self.run(PROBE_TIMEOUT_SECS, "echo ok")?;
        if output != "ok\n" {
            return Err(TrondError::CommandFailedWithOutput {
                cmd: format!("ssh {} echo ok", self.destination()),
                output: format!("unexpected output: {}", output.trim()),
            });
        }
        Ok(())
    }

    /// Create `dir` unless it already exists. Returns whether it was created.
    pub fn mkdir_if_missing(&self, dir: &str) -> Result<bool> {
        let quoted = shell_quote(dir);
        let probe = format!("[ -d {q} ] && echo exists || echo missing", q = quoted);
        if self.run(TRANSFER_TIMEOUT_SECS, &probe)? == "exists\n" {
            return Ok(false);
        }
        self.run(TRANSFER_TIMEOUT_SECS, &format!("mkdir -p {}", quoted))?;
        Ok(true)
    }

    /// Copy a local file to `remote` on the host.
    pub fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        self.exec(
            self.scp_command(TRANSFER_TIMEOUT_SECS, local, remote),
            format!("scp {} {}:{}", local.display(), self.destination(), remote),
        )?;
        Ok(())
    }

    /// `docker-compose -f <file> up -d` (or `down`) inside `dir` on the host.
    pub fn compose(&self, dir: &str, compose_file: &str, down: bool) -> Result<String> {
        let action = if down { "down" } else { "up -d" };
        let cmd = format!(
            "cd {} && docker-compose -f {} {}",
            shell_quote(dir),
            shell_quote(compose_file),
            action
        );
        self.run(COMPOSE_TIMEOUT_SECS, &cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(auth: Auth) -> SshTarget {
        SshTarget {
            host: "192.168.1.10".to_string(),
            port: 2222,
            user: "tron".to_string(),
            auth,
        }
    }

    #[test]
    fn test_auth_priority() {
        let sock = Some(OsStr::new("/tmp/agent.sock"));
        assert_eq!(
            Auth::select("h", Some("/k/id_rsa"), Some("pw"), sock).unwrap(),
            Auth::Key(PathBuf::from("/k/id_rsa"))
        );
        assert_eq!(
            Auth::select("h", None, Some("pw"), sock).unwrap(),
            Auth::Password("pw".to_string())
        );
        assert_eq!(Auth::select("h", Some(""), Some(""), sock).unwrap(), Auth::Agent);
    }

    #[test]
    fn test_auth_without_agent_fails() {
        assert!(matches!(
            Auth::select("10.0.0.1", None, None, None),
            Err(TrondError::NoAuthMethod(h)) if h == "10.0.0.1"
        ));
        assert!(Auth::select("h", None, None, Some(OsStr::new(""))).is_err());
    }

    #[test]
    fn test_describe_hides_password() {
        assert_eq!(Auth::Password("secret".into()).describe(), "Password");
        assert_eq!(Auth::Agent.describe(), "SSH Agent");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/home/tron"), "'/home/tron'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_ssh_command_with_key() {
        let t = target(Auth::Key(PathBuf::from("/k/id_rsa")));
        let (program, args) = t.ssh_command(5, "echo ok");
        assert_eq!(program, "ssh");
        assert!(args.contains(&"ConnectTimeout=5".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.windows(2).any(|w| w == ["-i", "/k/id_rsa"]));
        assert!(args.windows(2).any(|w| w == ["-p", "2222"]));
        assert_eq!(&args[args.len() - 2..], ["tron@192.168.1.10", "echo ok"]);
    }

    #[test]
    fn test_ssh_command_with_password_uses_sshpass() {
        let t = target(Auth::Password("pw".into()));
        let (program, args) = t.ssh_command(10, "true");
        assert_eq!(program, "sshpass");
        assert_eq!(&args[..3], ["-p", "pw", "ssh"]);
        assert!(!args.contains(&"BatchMode=yes".to_string()));
    }

    #[test]
    fn test_scp_command() {
        let t = target(Auth::Agent);
        let (program, args) = t.scp_command(
            10,
            Path::new("./conf/private_net_config_witness1.conf"),
            "/data/tron/conf/private_net_config_witness1.conf",
        );
        assert_eq!(program, "scp");
        assert!(args.windows(2).any(|w| w == ["-P", "2222"]));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(
            args.last().unwrap(),
            "tron@192.168.1.10:/data/tron/conf/private_net_config_witness1.conf"
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/key"), PathBuf::from("/abs/key"));
        assert_eq!(expand_home("~user/key"), PathBuf::from("~user/key"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ssh/id_rsa"), home.join(".ssh/id_rsa"));
            assert_eq!(
                Auth::select("h", Some("~/.ssh/id_rsa"), None, None).unwrap(),
                Auth::Key(home.join(".ssh/id_rsa"))
            );
        }
    }
}
