//! Core binding and Gantt trace recording.
//!
//! The kernel is the single source of truth for which processes run in a
//! tick; the dispatcher only binds that selection to core ids and appends to
//! the persistent execution trace.
use serde_derive::{Deserialize, Serialize};

/// One occupied core for one tick.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct GanttEntry {
    pub time: i32,
    pub core_id: usize,
    pub pid: i32,
}

#[derive(Clone)]
pub struct Dispatcher {
    cores: Vec<Option<i32>>,
    gantt: Vec<GanttEntry>,
}

impl Dispatcher {
    pub fn new(num_cores: usize) -> Self {
        Self {
            cores: vec![None; num_cores.max(1)],
            gantt: Vec::new(),
        }
    }

    /// Bind `runnable[i]` to core `i`, leaving unfilled cores empty, and
    /// record one Gantt entry per occupied core. The kernel pre-validates the
    /// selection, so `runnable` never exceeds the core count.
    pub fn tick(&mut self, time: i32, runnable: &[i32]) {
        for core_id in 0..self.cores.len() {
            let pid = runnable.get(core_id).copied();
            self.cores[core_id] = pid;
            if let Some(pid) = pid {
                self.gantt.push(GanttEntry { time, core_id, pid });
            }
        }
    }

    pub fn current_running(&self) -> Vec<i32> {
        self.cores.iter().filter_map(|&core| core).collect()
    }

    pub fn gantt(&self) -> &[GanttEntry] {
        &self.gantt
    }

    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_entry(time: i32, core_id: usize, pid: i32) -> GanttEntry {
        GanttEntry { time, core_id, pid }
    }

    #[test]
    fn test_dispatcher_new_normal() {
        let dispatcher = Dispatcher::new(2);
        assert_eq!(dispatcher.num_cores(), 2);
        assert!(dispatcher.current_running().is_empty());
        assert!(dispatcher.gantt().is_empty());
    }

    #[test]
    fn test_dispatcher_new_minimum_one_core() {
        let dispatcher = Dispatcher::new(0);
        assert_eq!(dispatcher.num_cores(), 1);
    }

    #[test]
    fn test_tick_normal() {
        let mut dispatcher = Dispatcher::new(2);
        dispatcher.tick(0, &[3, 5]);
        assert_eq!(dispatcher.current_running(), vec![3, 5]);
        assert_eq!(dispatcher.gantt(), &[create_entry(0, 0, 3), create_entry(0, 1, 5)]);
    }

    #[test]
    fn test_tick_fewer_processes_than_cores() {
        let mut dispatcher = Dispatcher::new(3);
        dispatcher.tick(4, &[9]);
        assert_eq!(dispatcher.current_running(), vec![9]);
        assert_eq!(dispatcher.gantt(), &[create_entry(4, 0, 9)]);
    }

    #[test]
    fn test_tick_rebinds_cores_each_tick() {
        let mut dispatcher = Dispatcher::new(2);
        dispatcher.tick(0, &[3, 5]);
        dispatcher.tick(1, &[5]);
        assert_eq!(dispatcher.current_running(), vec![5]);
        assert_eq!(
            dispatcher.gantt(),
            &[create_entry(0, 0, 3), create_entry(0, 1, 5), create_entry(1, 0, 5)]
        );
    }
}
