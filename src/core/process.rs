//! External process helpers
//!
//! Two flavours: `run_combined` collects output for the caller, `run_streaming`
//! echoes stdout and stderr live while the child runs (gradle, install
//! scripts). Streaming drains both pipes on separate tasks so a chatty child
//! never blocks on a full pipe.

use crate::core::error::{Result, TrondError};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

fn runtime() -> std::io::Result<&'static tokio::runtime::Runtime> {
    static RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    if let Some(rt) = RT.get() {
        return Ok(rt);
    }
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    Ok(RT.get_or_init(|| rt))
}

/// Render a command line for messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut s = program.to_string();
    for arg in args {
        s.push(' ');
        s.push_str(arg);
    }
    s
}

/// Run a command and return stdout and stderr merged, whatever the exit code.
pub fn run_combined(program: &str, args: &[String]) -> Result<(bool, String)> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok((output.status.success(), combined))
}

/// Run `bash -c <script>` in `dir`, streaming both output pipes line by line.
pub fn run_streaming(script: &str, dir: &Path) -> Result<()> {
    println!("{}", script);

    let mut cmd = tokio::process::Command::new("bash");
    cmd.args(["-c", script])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let status = runtime()?.block_on(async move {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out_task = tokio::spawn(async move {
            if let Some(pipe) = stdout {
                let mut lines = BufReader::new(pipe).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    println!("{}", line);
                }
            }
        });
        let err_task = tokio::spawn(async move {
            if let Some(pipe) = stderr {
                let mut lines = BufReader::new(pipe).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    eprintln!("{}", line);
                }
            }
        });

        let status = child.wait().await?;
        let _ = out_task.await;
        let _ = err_task.await;
        Ok::<_, std::io::Error>(status)
    })?;

    if !status.success() {
        return Err(TrondError::CommandFailed {
            cmd: script.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

/// Fail with `ToolMissing` unless `tool` resolves in PATH.
pub fn require_tool(tool: &str) -> Result<std::path::PathBuf> {
    which::which(tool).map_err(|_| TrondError::ToolMissing(tool.to_string()))
}

// ============================================================================
// docker-compose
// ============================================================================

fn compose_args(compose_file: &Path, action: &[&str]) -> Vec<String> {
    let mut args = vec!["-f".to_string(), compose_file.display().to_string()];
    args.extend(action.iter().map(|s| s.to_string()));
    args
}

/// `docker-compose -f <file> up -d`, run from `dir`.
pub fn compose_up(dir: &Path, compose_file: &Path) -> Result<String> {
    compose(dir, compose_file, &["up", "-d"])
}

/// `docker-compose -f <file> down`, run from `dir`.
pub fn compose_down(dir: &Path, compose_file: &Path) -> Result<String> {
    compose(dir, compose_file, &["down"])
}

fn compose(dir: &Path, compose_file: &Path, action: &[&str]) -> Result<String> {
    require_tool("docker-compose")?;
    let args = compose_args(compose_file, action);
    let output = Command::new("docker-compose")
        .args(&args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        return Err(TrondError::CommandFailedWithOutput {
            cmd: display_command("docker-compose", &args),
            output: combined.trim().to_string(),
        });
    }
    Ok(combined)
}
