//! PID inspection used for launch confirmation.

/// Check whether a process with the given PID exists.
///
/// Sends the null signal (`kill(pid, 0)`), which probes existence without
/// affecting the target.
pub fn is_process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

/// Verify that the command line of `pid` mentions `needle`.
///
/// Guards against the PID being recycled for an unrelated process between
/// spawn and confirmation. Linux reads `/proc/{pid}/cmdline`; other
/// platforms degrade to a plain liveness check.
pub fn command_matches(pid: u32, needle: &str) -> bool {
    #[cfg(target_os = "linux")]
    {
        // cmdline is NUL-separated
        match std::fs::read_to_string(format!("/proc/{}/cmdline", pid)) {
            Ok(cmdline) => cmdline.split('\0').any(|arg| arg.contains(needle)),
            Err(_) => false,
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = needle;
        is_process_alive(pid)
    }
}

/// Kill a process with SIGKILL. Returns `true` when the process was killed
/// or no longer exists.
pub fn kill_process(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, libc::SIGKILL) == 0 || !is_process_alive(pid) }
}
