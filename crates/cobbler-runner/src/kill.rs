#[cfg(unix)]
pub fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(pid as i32);
    if killpg(pgid, Signal::SIGTERM).is_err() {
        return;
    }
    std::thread::sleep(std::time::Duration::from_millis(200));
    let _ = killpg(pgid, Signal::SIGKILL);
}

#[cfg(not(unix))]
pub fn kill_process_group(_pid: u32) {
    tracing::warn!("process-group kill on timeout is unix-only; orphaned child may outlive us");
}
