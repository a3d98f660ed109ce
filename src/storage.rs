use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use sysinfo::Disks;

use crate::catalog::format_file_size;

/// Disk usage of the removable storage card, shaped for /api/status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub mount_path: String,
    pub total_space: String,
    pub used_space: String,
    pub free_space: String,
    pub usage_percent: String,
}

/// Block until the storage mount point exists, polling once per second. The
/// appliance boots faster than the kernel mounts the card, so startup waits
/// here; exceeding the timeout is fatal.
pub async fn wait_for_mount(path: &Path, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    while !path.exists() {
        if tokio::time::Instant::now() >= deadline {
            bail!(
                "storage mount {} did not appear within {}s",
                path.display(),
                timeout.as_secs()
            );
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Ok(())
}

/// Usage snapshot for the disk mounted at `mount`. All zeros when no disk is
/// mounted there, which the UI renders as an absent card.
pub fn storage_status(mount: &Path) -> StorageStatus {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks.iter().find(|disk| disk.mount_point() == mount);

    match disk {
        Some(disk) => {
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            let percent = if total > 0 { used * 100 / total } else { 0 };
            StorageStatus {
                mount_path: mount.display().to_string(),
                total_space: format_file_size(total),
                used_space: format_file_size(used),
                free_space: format_file_size(free),
                usage_percent: format!("{percent}%"),
            }
        }
        None => StorageStatus {
            mount_path: mount.display().to_string(),
            total_space: format_file_size(0),
            used_space: format_file_size(0),
            free_space: format_file_size(0),
            usage_percent: "0%".to_string(),
        },
    }
}
