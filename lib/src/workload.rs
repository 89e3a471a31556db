//! Generate a kernel configuration and process set from a yaml file
use std::fs;

use serde_derive::{Deserialize, Serialize};

use crate::{kernel::KernelConfig, process::ProcessRecord};

/// Creation-time parameters of one simulated process. `memory_demand` is in
/// bytes and defaults to 0 (no pages requested).
#[derive(Clone, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: i32,
    pub arrival_time: i32,
    pub total_cpu_time: i32,
    #[serde(default)]
    pub memory_demand: usize,
}

impl From<ProcessSpec> for ProcessRecord {
    fn from(spec: ProcessSpec) -> Self {
        ProcessRecord::new(spec.pid, spec.arrival_time, spec.total_cpu_time, spec.memory_demand)
    }
}

/// A full simulation input: kernel configuration plus process set. A missing
/// `kernel` section falls back to the default configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Workload {
    #[serde(default)]
    pub kernel: KernelConfig,
    pub processes: Vec<ProcessSpec>,
}

impl Workload {
    pub fn process_records(&self) -> Vec<ProcessRecord> {
        self.processes.iter().cloned().map(ProcessRecord::from).collect()
    }
}

/// load yaml file and return the workload it describes
///
/// # Arguments
///
/// *  `file_path` - yaml file path
///
/// # Returns
///
/// *  `workload` - kernel configuration and process set
pub fn create_workload_from_yaml(file_path: &str) -> Workload {
    let file_contents = fs::read_to_string(file_path)
        .unwrap_or_else(|_| panic!("Failed to read workload file: {}", file_path));
    serde_yaml::from_str(&file_contents)
        .unwrap_or_else(|err| panic!("Failed to parse workload file {}: {}", file_path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_workload_from_yaml_normal() {
        let workload = create_workload_from_yaml("tests/sample_workloads/basic_workload.yaml");
        assert_eq!(workload.kernel.num_levels(), 3);
        assert_eq!(workload.kernel.quanta(), &vec![1, 2, 4]);
        assert_eq!(workload.kernel.aging_interval(), 5);
        assert_eq!(workload.kernel.num_cores(), 2);
        assert_eq!(workload.processes.len(), 3);
        assert_eq!(workload.processes[0].pid, 1);
        assert_eq!(workload.processes[0].memory_demand, 128);
        // memory_demand is optional
        assert_eq!(workload.processes[2].memory_demand, 0);
    }

    #[test]
    fn test_workload_without_kernel_section_uses_defaults() {
        let yaml = "processes:\n  - pid: 1\n    arrival_time: 0\n    total_cpu_time: 2\n";
        let workload: Workload = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(workload.kernel, KernelConfig::default());
        assert_eq!(workload.processes.len(), 1);
    }

    #[test]
    fn test_process_records_normal() {
        let workload = create_workload_from_yaml("tests/sample_workloads/basic_workload.yaml");
        let records = workload.process_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].pid, 2);
        assert_eq!(records[1].remaining_cpu_time, records[1].total_cpu_time);
    }

    #[test]
    #[should_panic]
    fn test_create_workload_from_yaml_missing_file() {
        create_workload_from_yaml("tests/sample_workloads/no_such_file.yaml");
    }
}
