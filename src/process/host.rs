use std::collections::HashSet;
use std::env;
use std::time::Duration;

use sysinfo::{Disk, Disks, System, Users};

use super::{ensure_supported, percent, table, ProcessError};

/// Memory and swap figures in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

impl MemoryInfo {
    pub(crate) fn from_system(sys: &System) -> Self {
        MemoryInfo {
            total: sys.total_memory(),
            used: sys.used_memory(),
            free: sys.free_memory(),
            available: sys.available_memory(),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
            swap_free: sys.free_swap(),
        }
    }

    /// Reclaimable memory: what is available beyond the truly free pages.
    pub fn buff_cache(&self) -> u64 {
        self.available.saturating_sub(self.free)
    }

    pub fn percent(&self) -> f64 {
        percent(self.total.saturating_sub(self.available), self.total)
    }
}

/// Space on one mounted filesystem, in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub device: String,
    pub mount_point: String,
    pub total: u64,
    pub free: u64,
}

impl DiskUsage {
    fn from_disk(disk: &Disk) -> Self {
        DiskUsage {
            device: disk.name().to_string_lossy().into_owned(),
            mount_point: disk.mount_point().display().to_string(),
            total: disk.total_space(),
            free: disk.available_space(),
        }
    }

    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }

    pub fn percent(&self) -> f64 {
        percent(self.used(), self.total)
    }
}

pub fn memory() -> Result<MemoryInfo, ProcessError> {
    ensure_supported("memory information")?;
    let mut sys = System::new();
    sys.refresh_memory();
    Ok(MemoryInfo::from_system(&sys))
}

/// Mounted filesystems, one row per mount point.
pub fn disks() -> Result<Vec<DiskUsage>, ProcessError> {
    ensure_supported("disk information")?;
    let disks = Disks::new_with_refreshed_list();
    Ok(unique_mounts(disks.list().iter().map(DiskUsage::from_disk)))
}

fn unique_mounts(rows: impl Iterator<Item = DiskUsage>) -> Vec<DiskUsage> {
    let mut seen = HashSet::new();
    rows.filter(|d| seen.insert(d.mount_point.clone())).collect()
}

/// The filesystem mounted at `/`, or the first one listed where there is
/// no such mount.
pub fn root_disk() -> Result<DiskUsage, ProcessError> {
    let mut all = disks()?;
    if all.is_empty() {
        return Err(ProcessError::NoFilesystem("/".to_string()));
    }
    let index = all.iter().position(|d| d.mount_point == "/").unwrap_or(0);
    Ok(all.swap_remove(index))
}

pub fn uptime() -> Duration {
    Duration::from_secs(System::uptime())
}

pub fn load_average() -> [f64; 3] {
    let load = System::load_average();
    [load.one, load.five, load.fifteen]
}

/// OS name and kernel release, e.g. `Ubuntu 6.8.0-45-generic`.
pub fn os_description() -> String {
    let name = System::name().unwrap_or_else(|| "Unknown".to_string());
    match System::kernel_version() {
        Some(release) => format!("{} {}", name, release),
        None => name,
    }
}

/// Login name from the environment, falling back to the owner of this
/// process.
pub fn current_user() -> String {
    ["LOGNAME", "USER", "LNAME", "USERNAME"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
        .or_else(owner_name)
        .unwrap_or_else(|| "unknown".to_string())
}

fn owner_name() -> Option<String> {
    let uid = table::own_uid()?;
    let users = Users::new_with_refreshed_list();
    users.get_user_by_id(&uid).map(|user| user.name().to_string())
}

pub fn host_name() -> Option<String> {
    System::host_name().filter(|name| !name.is_empty())
}
