//! This module contains the definition of a simulated process and its lifecycle state
use serde_derive::{Deserialize, Serialize};

/// Lifecycle of a simulated process. `Terminated` is absorbing.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ProcessState {
    #[default]
    New,
    Ready,
    Waiting,
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: i32,
    pub arrival_time: i32,
    pub total_cpu_time: i32,
    pub memory_demand: usize,
    pub remaining_cpu_time: i32,
    pub priority_level: usize,
    pub quantum_consumed: i32,
    pub wait_ticks: i32,
    pub state: ProcessState,
    pub start_time: i32,
    pub response_time: i32,
    pub finish_time: i32,
}

impl ProcessRecord {
    pub fn new(pid: i32, arrival_time: i32, total_cpu_time: i32, memory_demand: usize) -> Self {
        Self {
            pid,
            arrival_time,
            total_cpu_time,
            memory_demand,
            remaining_cpu_time: total_cpu_time,
            priority_level: 0,
            quantum_consumed: 0,
            wait_ticks: 0,
            state: ProcessState::New,
            start_time: -1,
            response_time: -1,
            finish_time: -1,
        }
    }

    /// Restore every mutable field to its pre-run default.
    pub fn reset(&mut self) {
        self.remaining_cpu_time = self.total_cpu_time;
        self.priority_level = 0;
        self.quantum_consumed = 0;
        self.wait_ticks = 0;
        self.state = ProcessState::New;
        self.start_time = -1;
        self.response_time = -1;
        self.finish_time = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_record_new_normal() {
        let record = ProcessRecord::new(1, 3, 10, 128);
        assert_eq!(record.pid, 1);
        assert_eq!(record.arrival_time, 3);
        assert_eq!(record.total_cpu_time, 10);
        assert_eq!(record.memory_demand, 128);
        assert_eq!(record.remaining_cpu_time, 10);
        assert_eq!(record.priority_level, 0);
        assert_eq!(record.quantum_consumed, 0);
        assert_eq!(record.wait_ticks, 0);
        assert_eq!(record.state, ProcessState::New);
        assert_eq!(record.start_time, -1);
        assert_eq!(record.response_time, -1);
        assert_eq!(record.finish_time, -1);
    }

    #[test]
    fn test_process_record_reset_normal() {
        let mut record = ProcessRecord::new(1, 0, 5, 0);
        record.remaining_cpu_time = 0;
        record.priority_level = 2;
        record.quantum_consumed = 1;
        record.wait_ticks = 7;
        record.state = ProcessState::Terminated;
        record.start_time = 0;
        record.response_time = 0;
        record.finish_time = 5;

        record.reset();

        assert_eq!(record, ProcessRecord::new(1, 0, 5, 0));
    }
}
