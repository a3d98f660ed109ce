//! Process-table edge. Existence probes and termination go through sysinfo;
//! elapsed runtime keeps the `ps` etime interface the appliance tooling has
//! always exposed, queried by pid rather than by command-line match.

use std::process::Command;
use sysinfo::{Pid, Signal, System};

/// Non-invasive existence probe (not a capability check).
pub fn pid_alive(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from_u32(pid))
}

/// Terminate a process by id, TERM first so the segmenter can finalize the
/// open segment. Returns false when no such process exists.
pub fn kill_pid(pid: u32) -> bool {
    let mut sys = System::new();
    let pid = Pid::from_u32(pid);
    if !sys.refresh_process(pid) {
        return false;
    }
    match sys.process(pid) {
        Some(process) => process
            .kill_with(Signal::Term)
            .unwrap_or_else(|| process.kill()),
        None => false,
    }
}

/// Elapsed runtime of a process as reported by `ps`, normalized to at least
/// `HH:MM:SS`. A process that is gone reports `00:00:00`.
pub fn elapsed_runtime(pid: u32) -> String {
    let output = Command::new("ps")
        .args(["-o", "etime=", "-p", &pid.to_string()])
        .output();

    match output {
        Ok(out) if out.status.success() => normalize_etime(&String::from_utf8_lossy(&out.stdout)),
        _ => "00:00:00".to_string(),
    }
}

/// Normalize a ps etime field. ps prints `MM:SS` under an hour, `HH:MM:SS`
/// under a day, and `D-HH:MM:SS` beyond; days fold into the hours field,
/// which may exceed 24.
pub fn normalize_etime(etime: &str) -> String {
    let etime = etime.trim();
    if etime.is_empty() {
        return "00:00:00".to_string();
    }

    if let Some((days, clock)) = etime.split_once('-') {
        let days: u64 = match days.parse() {
            Ok(days) => days,
            Err(_) => return "00:00:00".to_string(),
        };
        return match clock.split_once(':') {
            Some((hours, rest)) => match hours.parse::<u64>() {
                Ok(hours) => format!("{:02}:{}", days * 24 + hours, rest),
                Err(_) => "00:00:00".to_string(),
            },
            None => "00:00:00".to_string(),
        };
    }

    match etime.matches(':').count() {
        1 => format!("00:{etime}"),
        2 => etime.to_string(),
        _ => "00:00:00".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_etime;

    #[test]
    fn minutes_seconds_gain_an_hours_field() {
        assert_eq!(normalize_etime("45:12"), "00:45:12");
    }

    #[test]
    fn full_clock_passes_through() {
        assert_eq!(normalize_etime("03:10:05"), "03:10:05");
    }

    #[test]
    fn days_fold_into_hours() {
        assert_eq!(normalize_etime("2-03:10:05"), "51:10:05");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(normalize_etime(" 45:12\n"), "00:45:12");
    }

    #[test]
    fn garbage_reports_zero() {
        assert_eq!(normalize_etime(""), "00:00:00");
        assert_eq!(normalize_etime("x-bad:input"), "00:00:00");
        assert_eq!(normalize_etime("nonsense"), "00:00:00");
    }
}
