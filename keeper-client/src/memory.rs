//! Process memory sampling for heartbeats.

/// Resident and peak memory of the current process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub resident_bytes: u64,
    pub peak_bytes: u64,
}

impl MemorySample {
    /// Samples the current process. Zero on platforms without `/proc`.
    pub fn current() -> Self {
        std::fs::read_to_string("/proc/self/status")
            .map(|status| Self::parse_proc_status(&status))
            .unwrap_or_default()
    }

    /// Reads `VmRSS` and `VmHWM` (reported in kB) from a `/proc/<pid>/status` body.
    pub fn parse_proc_status(status: &str) -> Self {
        let mut sample = Self::default();
        for line in status.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let kb = value
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            match key {
                "VmRSS" => sample.resident_bytes = kb * 1024,
                "VmHWM" => sample.peak_bytes = kb * 1024,
                _ => {}
            }
        }
        sample
    }
}
