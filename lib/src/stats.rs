//! Serializable result snapshots and their YAML dump helpers.
use serde_derive::{Deserialize, Serialize};

use crate::{
    dispatcher::GanttEntry,
    memory::{MemoryEvent, MemoryStats},
    output_log::append_info_to_yaml,
    process::ProcessState,
};

/// Static description of one simulation run.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SimulationInfo {
    pub num_levels: usize,
    pub quanta: Vec<i32>,
    pub aging_interval: i32,
    pub number_of_cores: usize,
    pub total_processes: usize,
}

impl SimulationInfo {
    pub fn dump_simulation_info_to_yaml(&self, file_path: &str) {
        let yaml =
            serde_yaml::to_string(&self).expect("Failed to serialize SimulationInfo to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}

/// Cumulative scheduler statistics over the terminated processes.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub finished_processes: usize,
    pub average_wait_time: f32,
    pub average_turnaround_time: f32,
    pub average_response_time: f32,
    pub cpu_utilization: f32,
    pub memory: MemoryStats,
}

impl SchedulerStats {
    pub fn dump_scheduler_stats_to_yaml(&self, file_path: &str) {
        let yaml =
            serde_yaml::to_string(&self).expect("Failed to serialize SchedulerStats to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}

/// Timing of one process; `-1` marks events that never happened.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProcessLog {
    pub pid: i32,
    pub arrival_time: i32,
    pub start_time: i32,
    pub finish_time: i32,
    pub response_time: i32,
    pub wait_time: i32,
    pub turnaround_time: i32,
    pub state: ProcessState,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProcessSetLog {
    pub process_logs: Vec<ProcessLog>,
}

impl ProcessSetLog {
    pub fn dump_process_set_log_to_yaml(&self, file_path: &str) {
        let yaml =
            serde_yaml::to_string(&self).expect("Failed to serialize ProcessSetLog to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GanttLog {
    pub entries: Vec<GanttEntry>,
}

impl GanttLog {
    pub fn dump_gantt_log_to_yaml(&self, file_path: &str) {
        let yaml = serde_yaml::to_string(&self).expect("Failed to serialize GanttLog to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryEventLog {
    pub events: Vec<MemoryEvent>,
}

impl MemoryEventLog {
    pub fn dump_memory_event_log_to_yaml(&self, file_path: &str) {
        let yaml =
            serde_yaml::to_string(&self).expect("Failed to serialize MemoryEventLog to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_log::create_yaml_file;
    use std::fs::remove_file;

    #[test]
    fn test_dump_scheduler_stats_to_yaml_normal() {
        let stats = SchedulerStats {
            finished_processes: 2,
            average_wait_time: 1.5,
            average_turnaround_time: 5.5,
            average_response_time: 0.5,
            cpu_utilization: 1.0,
            memory: MemoryStats {
                total_pages: 16,
                used_pages: 0,
                free_pages: 16,
                swapped_pages: 0,
                cache_occupancy: 0,
            },
        };
        let file_path = create_yaml_file("../outputs", "test_dump_scheduler_stats_to_yaml_normal");
        stats.dump_scheduler_stats_to_yaml(&file_path);

        let file_contents = std::fs::read_to_string(&file_path).unwrap();
        let read_stats: SchedulerStats = serde_yaml::from_str(&file_contents).unwrap();

        assert_eq!(read_stats.finished_processes, 2);
        assert_eq!(read_stats.average_wait_time, 1.5);
        assert_eq!(read_stats.average_turnaround_time, 5.5);
        assert_eq!(read_stats.cpu_utilization, 1.0);
        assert_eq!(read_stats.memory.total_pages, 16);
        remove_file(file_path).unwrap();
    }

    #[test]
    fn test_dump_gantt_log_to_yaml_normal() {
        let gantt_log = GanttLog {
            entries: vec![
                GanttEntry { time: 0, core_id: 0, pid: 1 },
                GanttEntry { time: 0, core_id: 1, pid: 2 },
                GanttEntry { time: 1, core_id: 0, pid: 1 },
            ],
        };
        let file_path = create_yaml_file("../outputs", "test_dump_gantt_log_to_yaml_normal");
        gantt_log.dump_gantt_log_to_yaml(&file_path);

        let file_contents = std::fs::read_to_string(&file_path).unwrap();
        let read_log: GanttLog = serde_yaml::from_str(&file_contents).unwrap();

        assert_eq!(read_log.entries.len(), 3);
        assert_eq!(read_log.entries[1], GanttEntry { time: 0, core_id: 1, pid: 2 });
        remove_file(file_path).unwrap();
    }
}
