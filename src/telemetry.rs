use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use sysinfo::{Components, Disks, System};

/// Point-in-time system health snapshot for the monitoring endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SystemMonitor {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub load_average: f64,
    pub uptime: String,
    pub temperature: f64,
    pub timestamp: i64,
}

/// Sample CPU, memory, storage-disk usage, load, uptime, and temperature.
/// CPU usage needs two refreshes separated by a short interval, so this
/// call takes ~200ms.
pub async fn sample(mount: &Path) -> SystemMonitor {
    let mut sys = System::new();
    sys.refresh_cpu();
    tokio::time::sleep(Duration::from_millis(200)).await;
    sys.refresh_cpu();
    sys.refresh_memory();

    let memory_usage = if sys.total_memory() > 0 {
        sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
    } else {
        0.0
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_usage = disks
        .iter()
        .find(|disk| disk.mount_point() == mount)
        .map(|disk| {
            let total = disk.total_space();
            if total > 0 {
                total.saturating_sub(disk.available_space()) as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        })
        .unwrap_or(0.0);

    // hottest sensor stands in for board temperature
    let temperature = Components::new_with_refreshed_list()
        .iter()
        .map(|component| component.temperature() as f64)
        .fold(0.0, f64::max);

    SystemMonitor {
        cpu_usage: sys.global_cpu_info().cpu_usage() as f64,
        memory_usage,
        disk_usage,
        load_average: System::load_average().one,
        uptime: format_uptime(System::uptime()),
        temperature,
        timestamp: chrono::Utc::now().timestamp(),
    }
}

/// "up 2 days, 3 hours, 4 minutes", the uptime(1) style the web UI shows
/// verbatim.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} day{}", days, if days == 1 { "" } else { "s" }));
    }
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
    }
    parts.push(format!(
        "{} minute{}",
        minutes,
        if minutes == 1 { "" } else { "s" }
    ));

    format!("up {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::format_uptime;

    #[test]
    fn uptime_formats_like_uptime_p() {
        assert_eq!(format_uptime(60), "up 1 minute");
        assert_eq!(format_uptime(3 * 3600 + 120), "up 3 hours, 2 minutes");
        assert_eq!(
            format_uptime(2 * 86_400 + 3600 + 60),
            "up 2 days, 1 hour, 1 minute"
        );
    }
}
