use std::thread;

use sysinfo::{
    Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, Uid, UpdateKind,
    Users, MINIMUM_CPU_UPDATE_INTERVAL,
};

use super::{ensure_supported, percent, MemoryInfo, ProcessError};

/// One row of the process table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub status: &'static str,
    pub uid: Option<Uid>,
    pub user: Option<String>,
    pub cmdline: Vec<String>,
    /// Share of one core since the previous refresh; 0 on a single sample.
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

impl ProcessInfo {
    /// Full command line, or the process name for kernel threads.
    pub fn command(&self) -> String {
        if self.cmdline.is_empty() {
            self.name.clone()
        } else {
            self.cmdline.join(" ")
        }
    }
}

fn status_name(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "running",
        ProcessStatus::Sleep => "sleeping",
        ProcessStatus::UninterruptibleDiskSleep => "disk-sleep",
        ProcessStatus::Idle => "idle",
        ProcessStatus::Stop => "stopped",
        ProcessStatus::Tracing => "tracing-stop",
        ProcessStatus::Zombie => "zombie",
        ProcessStatus::Dead => "dead",
        ProcessStatus::Waking => "waking",
        ProcessStatus::Parked => "parked",
        _ => "?",
    }
}

fn refresh_processes(sys: &mut System) {
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::everything(),
    );
}

/// Uid owning this process.
pub(crate) fn own_uid() -> Option<Uid> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_user(UpdateKind::Always),
    );
    sys.process(pid)?.user_id().cloned()
}

/// Snapshot of processes, memory and CPU load.
pub struct ProcessTable {
    sys: System,
    users: Users,
}

impl ProcessTable {
    /// Single sample. CPU figures read as zero.
    pub fn load() -> Result<Self, ProcessError> {
        ensure_supported("process listing")?;
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        refresh_processes(&mut sys);
        Ok(ProcessTable {
            sys,
            users: Users::new_with_refreshed_list(),
        })
    }

    /// Two samples apart, so CPU usage is measured over the gap.
    pub fn sampled() -> Result<Self, ProcessError> {
        let mut table = Self::load()?;
        thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        table.sys.refresh_cpu_usage();
        refresh_processes(&mut table.sys);
        Ok(table)
    }

    pub fn cpu_percent(&self) -> f64 {
        f64::from(self.sys.global_cpu_usage())
    }

    pub fn memory(&self) -> MemoryInfo {
        MemoryInfo::from_system(&self.sys)
    }

    pub fn current_uid(&self) -> Option<Uid> {
        let pid = sysinfo::get_current_pid().ok()?;
        self.sys.process(pid)?.user_id().cloned()
    }

    /// Processes ordered by pid. Threads are left out.
    pub fn processes(&self) -> Vec<ProcessInfo> {
        let total = self.sys.total_memory();
        let mut rows: Vec<ProcessInfo> = self
            .sys
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .map(|p| self.row(p, total))
            .collect();
        rows.sort_by_key(|p| p.pid);
        rows
    }

    fn row(&self, p: &Process, total_memory: u64) -> ProcessInfo {
        let uid = p.user_id().cloned();
        let user = uid
            .as_ref()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string());
        ProcessInfo {
            pid: p.pid().as_u32(),
            name: p.name().to_string_lossy().into_owned(),
            status: status_name(p.status()),
            uid,
            user,
            cmdline: p
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            cpu_percent: f64::from(p.cpu_usage()),
            mem_percent: percent(p.memory(), total_memory),
        }
    }
}
