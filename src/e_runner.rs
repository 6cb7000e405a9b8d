use crate::e_types::{Invocation, InvocationResult};
use crate::prelude::*;
use anyhow::{Context, Result};
use dashmap::DashSet;
use once_cell::sync::Lazy;
use std::io::{Read, Write};
use std::sync::{MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Process ids of children currently being waited on.
///
/// On unix each child leads its own process group, so the Ctrl+C handler
/// kills the whole group by this id.
pub static ACTIVE_PIDS: Lazy<DashSet<u32>> = Lazy::new(DashSet::new);

const POLL: Duration = Duration::from_millis(25);

/// How long to wait for the pipe readers after the child has exited.
const READER_GRACE: Duration = Duration::from_secs(2);

type SharedBuf = Arc<Mutex<Vec<u8>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers a global Ctrl+C handler once.
/// The handler kills every running child, or exits when there is none.
pub fn register_ctrlc_handler() -> Result<()> {
    ctrlc::set_handler(move || {
        if ACTIVE_PIDS.is_empty() {
            eprintln!("Ctrl+C pressed, no child process running. Exiting nicely.");
            exit(130);
        }
        eprintln!("Ctrl+C pressed, terminating running child process...");
        for pid in ACTIVE_PIDS.iter() {
            kill_group(*pid);
        }
    })
    .context("failed to install Ctrl+C handler")?;
    Ok(())
}

#[cfg(unix)]
fn kill_group(pid: u32) -> bool {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => true,
        Err(e) => {
            debug!("killpg({}) failed: {}", pid, e);
            false
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) -> bool {
    // Children share the console and receive Ctrl+C themselves.
    false
}

/// Kills the child and, on unix, every process in its process group.
fn kill_child_tree(child: &mut Child) {
    if !kill_group(child.id()) {
        let _ = child.kill();
    }
}

/// Fails early with a readable message when a bare program name is not on PATH.
///
/// Paths (anything containing a separator) are left for the OS to resolve,
/// since they may be relative to the invocation's working directory.
pub fn ensure_program_exists(program: &str) -> Result<()> {
    if program.contains('/') || program.contains(std::path::MAIN_SEPARATOR) {
        return Ok(());
    }
    which::which(program)
        .map(|path| debug!("resolved {} -> {}", program, path.display()))
        .with_context(|| format!("'{}' not found in PATH", program))
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> (SharedBuf, Option<JoinHandle<()>>) {
    let buf: SharedBuf = Arc::new(Mutex::new(Vec::new()));
    let handle = source.map(|mut src| {
        let sink = Arc::clone(&buf);
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match src.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => lock(&sink).extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!("pipe read failed: {}", e);
                        break;
                    }
                }
            }
        })
    });
    (buf, handle)
}

/// Joins a reader, waiting no later than `deadline` for it to reach EOF.
fn collect_output(buf: SharedBuf, handle: Option<JoinHandle<()>>, deadline: Instant) -> String {
    if let Some(handle) = handle {
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL);
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            // A grandchild still holds the pipe open.
            warn!("output pipe still open after child exit; keeping partial output");
        }
    }
    let bytes = lock(&buf).clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Polls `child` until it exits or `timeout` elapses.
/// Returns the exit code (if any) and whether the timeout fired.
fn wait_for_exit(
    child: &mut Child,
    start: Instant,
    timeout: Option<Duration>,
) -> Result<(Option<i32>, bool)> {
    loop {
        if let Some(status) = child.try_wait().context("failed to poll child process")? {
            return Ok((status.code(), false));
        }
        if let Some(limit) = timeout {
            if start.elapsed() >= limit {
                warn!("pid {} exceeded timeout of {:?}; killing", child.id(), limit);
                kill_child_tree(&mut *child);
                let status = child.wait().context("failed to reap timed-out child")?;
                return Ok((status.code(), true));
            }
        }
        thread::sleep(POLL);
    }
}

/// Runs `inv` to completion and captures everything it writes.
///
/// stdout and stderr are piped and drained on their own threads so a chatty
/// child never blocks on a full pipe. When `inv.timeout` elapses the child
/// (and its process group on unix) is killed and the result is marked
/// `timed_out`. A child that cannot be spawned is an error, not a result.
pub fn run_invocation(inv: &Invocation) -> Result<InvocationResult> {
    ensure_program_exists(&inv.program)?;

    let mut cmd = inv.to_command();
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if inv.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    info!("running {}: {}", inv.label, inv.command_line());
    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn `{}`", inv.command_line()))?;

    let (out_buf, out_handle) = spawn_reader(child.stdout.take());
    let (err_buf, err_handle) = spawn_reader(child.stderr.take());
    if let (Some(payload), Some(mut stdin)) = (inv.stdin.clone(), child.stdin.take()) {
        thread::spawn(move || {
            if let Err(e) = stdin.write_all(&payload) {
                debug!("writing stdin payload failed: {}", e);
            }
        });
    }

    let pid = child.id();
    ACTIVE_PIDS.insert(pid);
    let waited = wait_for_exit(&mut child, start, inv.timeout);
    ACTIVE_PIDS.remove(&pid);
    let (exit_code, timed_out) = waited?;
    let elapsed = start.elapsed();
    // Both readers share one grace period.
    let readers_deadline = Instant::now() + READER_GRACE;

    let result = InvocationResult {
        label: inv.label.clone(),
        command: std::iter::once(inv.program.clone())
            .chain(inv.args.iter().cloned())
            .collect(),
        stdout: collect_output(out_buf, out_handle, readers_deadline),
        stderr: collect_output(err_buf, err_handle, readers_deadline),
        exit_code,
        timed_out,
        elapsed,
    };
    debug!(
        "{} finished: {} in {:?} ({} / {} bytes captured)",
        result.label,
        result.outcome(),
        elapsed,
        result.stdout.len(),
        result.stderr.len()
    );
    Ok(result)
}

/// Runs `inv`, prints the command, its captured output verbatim, and a
/// one-line verdict.
pub fn run_and_report(inv: &Invocation) -> Result<InvocationResult> {
    println!("Running: {}", inv.command_line());
    let result = run_invocation(inv)?;
    result.print_verbatim();
    if result.timed_out {
        if let Some(limit) = inv.timeout {
            eprintln!("{} timed out after {} seconds", inv.label, limit.as_secs());
        }
    }
    println!(
        "{}: {} [{}]",
        result.label,
        crate::e_fmt::paint_outcome(result.outcome()),
        crate::e_fmt::format_duration_secs(result.elapsed)
    );
    Ok(result)
}

/// Runs each invocation in order and stops at the first failure.
///
/// Every result produced so far is returned, the failing one last.
pub fn run_until_failure(invocations: &[Invocation]) -> Result<Vec<InvocationResult>> {
    let mut results = Vec::with_capacity(invocations.len());
    for inv in invocations {
        let result = run_and_report(inv)?;
        let failed = !result.success();
        results.push(result);
        if failed {
            warn!("{} failed; skipping remaining invocations", inv.label);
            break;
        }
    }
    Ok(results)
}
