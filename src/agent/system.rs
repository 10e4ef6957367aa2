//! Process and host statistics via sysinfo

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

/// A named gauge reading
pub type Reading = (String, f64);

/// Samples this process and the host it runs on
pub struct SystemSampler {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl std::fmt::Debug for SystemSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSampler").field("pid", &self.pid).finish()
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid()
            .inspect_err(|e| debug!("Process statistics unavailable: {}", e))
            .ok();
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    /// Memory, CPU, disk IO, run time and thread count of this process
    pub fn sample_process(&self) -> Vec<Reading> {
        let Some(pid) = self.pid else {
            return Vec::new();
        };

        let mut sys = self.system.lock();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new()
                .with_cpu()
                .with_memory()
                .with_disk_usage(),
        );

        let Some(process) = sys.process(pid) else {
            return Vec::new();
        };
        let disk = process.disk_usage();

        let mut readings = vec![
            reading("ResidentMemory", process.memory() as f64),
            reading("VirtualMemory", process.virtual_memory() as f64),
            reading("ProcessCPU", f64::from(process.cpu_usage())),
            reading("DiskReadBytes", disk.read_bytes as f64),
            reading("DiskWrittenBytes", disk.written_bytes as f64),
            reading("TotalDiskReadBytes", disk.total_read_bytes as f64),
            reading("TotalDiskWrittenBytes", disk.total_written_bytes as f64),
            reading("RunTime", process.run_time() as f64),
        ];
        if let Some(tasks) = process.tasks() {
            readings.push(reading("Threads", tasks.len() as f64));
        }
        readings
    }

    /// Memory, swap, load, uptime and CPU utilisation of the host
    pub fn sample_host(&self) -> Vec<Reading> {
        let mut sys = self.system.lock();
        sys.refresh_memory();
        sys.refresh_cpu_usage();

        let load = System::load_average();
        let mut readings = vec![
            reading("TotalMemory", sys.total_memory() as f64),
            reading("FreeMemory", sys.free_memory() as f64),
            reading("AvailableMemory", sys.available_memory() as f64),
            reading("UsedMemory", sys.used_memory() as f64),
            reading("TotalSwap", sys.total_swap() as f64),
            reading("UsedSwap", sys.used_swap() as f64),
            reading("FreeSwap", sys.free_swap() as f64),
            reading("LoadAverage1", load.one),
            reading("LoadAverage5", load.five),
            reading("LoadAverage15", load.fifteen),
            reading("Uptime", System::uptime() as f64),
            reading("CPUUsage", f64::from(sys.global_cpu_usage())),
        ];

        readings.extend(
            sys.cpus()
                .iter()
                .enumerate()
                .map(|(i, cpu)| reading(&format!("CPUutilization{}", i + 1), f64::from(cpu.cpu_usage()))),
        );
        readings
    }
}

fn reading(name: &str, value: f64) -> Reading {
    (name.to_string(), value)
}
