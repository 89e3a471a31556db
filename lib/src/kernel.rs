//! Multi-level feedback queue kernel with aging and paged memory.
//!
//! The kernel advances in discrete ticks. Each tick runs a fixed phase order:
//! arrivals, aging, core selection, execution, disposition, clock advance.
//! The phase order must not change: aging has to see queue contents before
//! selection removes entries, and disposition has to run after execution has
//! decremented the remaining time.
use std::collections::{BTreeMap, VecDeque};

use getset::{CopyGetters, Getters, Setters};
use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::{
    dispatcher::{Dispatcher, GanttEntry},
    memory::{MemoryEvent, MemoryManager, MemoryStats},
    process::{ProcessRecord, ProcessState},
    stats::{ProcessLog, ProcessSetLog, SchedulerStats, SimulationInfo},
};

const DEFAULT_QUANTUM: i32 = 1;

/// Constructor-time configuration, normalized to safe minimums so that
/// `step()` itself can never fail.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Getters, CopyGetters, Setters)]
#[serde(default)]
pub struct KernelConfig {
    #[getset(get_copy = "pub")]
    num_levels: usize,
    #[getset(get = "pub")]
    quanta: Vec<i32>,
    #[getset(get_copy = "pub")]
    aging_interval: i32,
    #[getset(get_copy = "pub", set = "pub")]
    num_cores: usize,
    #[getset(get_copy = "pub")]
    ram_bytes: usize,
    #[getset(get_copy = "pub")]
    page_size: usize,
    #[getset(get_copy = "pub")]
    cache_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            num_levels: 3,
            quanta: vec![1, 2, 4],
            aging_interval: 5,
            num_cores: 1,
            ram_bytes: 1024,
            page_size: 64,
            cache_capacity: 32,
        }
    }
}

impl KernelConfig {
    pub fn new(
        num_levels: usize,
        quanta: Vec<i32>,
        aging_interval: i32,
        num_cores: usize,
        ram_bytes: usize,
        page_size: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            num_levels,
            quanta,
            aging_interval,
            num_cores,
            ram_bytes,
            page_size,
            cache_capacity,
        }
    }

    /// Clamp every parameter to a usable minimum: at least one level and one
    /// core, a positive aging interval and page size, and one quantum per
    /// level (short lists are padded with their last entry).
    pub fn normalized(mut self) -> Self {
        self.num_levels = self.num_levels.max(1);
        self.num_cores = self.num_cores.max(1);
        self.aging_interval = self.aging_interval.max(1);
        self.page_size = self.page_size.max(1);
        self.quanta.truncate(self.num_levels);
        if self.quanta.is_empty() {
            self.quanta.push(DEFAULT_QUANTUM);
        }
        while self.quanta.len() < self.num_levels {
            let last = *self.quanta.last().unwrap();
            self.quanta.push(last);
        }
        for quantum in &mut self.quanta {
            *quantum = (*quantum).max(1);
        }
        self
    }
}

pub struct Kernel {
    config: KernelConfig,
    clock: i32,
    busy_ticks: i32,
    queues: Vec<VecDeque<i32>>,
    processes: BTreeMap<i32, ProcessRecord>,
    aging_ticks: BTreeMap<i32, i32>,
    terminated: Vec<i32>,
    running: Vec<i32>,
    memory: MemoryManager,
    dispatcher: Dispatcher,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        let config = config.normalized();
        let memory = MemoryManager::new(
            config.ram_bytes(),
            config.page_size(),
            config.cache_capacity(),
        );
        let dispatcher = Dispatcher::new(config.num_cores());
        let queues = vec![VecDeque::new(); config.num_levels()];
        Self {
            config,
            clock: 0,
            busy_ticks: 0,
            queues,
            processes: BTreeMap::new(),
            aging_ticks: BTreeMap::new(),
            terminated: Vec::new(),
            running: Vec::new(),
            memory,
            dispatcher,
        }
    }

    /// Register a process. Pids are caller-assigned and must be unique while
    /// the process exists in the system; a duplicate is a caller bug.
    pub fn add_process(&mut self, record: ProcessRecord) {
        assert!(
            !self.processes.contains_key(&record.pid),
            "pid {} is already registered",
            record.pid
        );
        self.aging_ticks.insert(record.pid, 0);
        self.processes.insert(record.pid, record);
    }

    /// Re-arm the simulation for a fresh run, keeping the registered process
    /// set. Memory and the dispatcher are rebuilt so no pages or trace
    /// entries leak from an interrupted run.
    pub fn initialize(&mut self) {
        self.clock = 0;
        self.busy_ticks = 0;
        self.terminated.clear();
        self.running.clear();
        for queue in &mut self.queues {
            queue.clear();
        }
        for record in self.processes.values_mut() {
            record.reset();
        }
        for ticks in self.aging_ticks.values_mut() {
            *ticks = 0;
        }
        self.memory = MemoryManager::new(
            self.config.ram_bytes(),
            self.config.page_size(),
            self.config.cache_capacity(),
        );
        self.dispatcher = Dispatcher::new(self.config.num_cores());
    }

    /// `initialize`, additionally forgetting the registered process set.
    pub fn reset(&mut self) {
        self.processes.clear();
        self.aging_ticks.clear();
        self.initialize();
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) {
        self.handle_arrivals();
        self.apply_aging();
        let selected = self.select_runnable();
        self.dispatcher.tick(self.clock, &selected);
        if !selected.is_empty() {
            self.busy_ticks += 1;
        }
        self.execute_selected(&selected);
        self.dispose_selected(&selected);
        self.running = selected;
        self.clock += 1;
    }

    /// Every `New` process whose arrival time is now requests memory; on
    /// success it becomes `Ready` at level 0, on failure it parks in
    /// `Waiting`. Processes are scanned in pid order.
    fn handle_arrivals(&mut self) {
        let pids: Vec<i32> = self.processes.keys().copied().collect();
        for pid in pids {
            let record = &self.processes[&pid];
            if record.state != ProcessState::New || record.arrival_time != self.clock {
                continue;
            }
            let demand = record.memory_demand;
            if self.memory.allocate(pid, demand) {
                let record = self.processes.get_mut(&pid).unwrap();
                record.state = ProcessState::Ready;
                record.priority_level = 0;
                self.queues[0].push_back(pid);
            } else {
                warn!("pid {} cannot get {} bytes at arrival; parking in Waiting", pid, demand);
                self.processes.get_mut(&pid).unwrap().state = ProcessState::Waiting;
            }
        }
    }

    /// Every queued process accumulates one aging tick; on a positive
    /// multiple of the aging interval a process below level 0 moves to the
    /// front of the next-higher queue. Levels are scanned top-down, so a
    /// promoted process is never aged twice in one tick.
    fn apply_aging(&mut self) {
        let interval = self.config.aging_interval();
        for level in 0..self.config.num_levels() {
            let queued: Vec<i32> = self.queues[level].iter().copied().collect();
            for pid in queued {
                let ticks = self.aging_ticks.entry(pid).or_insert(0);
                *ticks += 1;
                if level > 0 && *ticks % interval == 0 {
                    if let Some(position) =
                        self.queues[level].iter().position(|&queued_pid| queued_pid == pid)
                    {
                        self.queues[level].remove(position);
                    }
                    self.queues[level - 1].push_front(pid);
                    let record = self.processes.get_mut(&pid).unwrap();
                    record.priority_level = level - 1;
                    record.quantum_consumed = 0;
                    info!("pid {} aged up to level {}", pid, level - 1);
                }
            }
        }
    }

    /// Dequeue FIFO from the highest level down until every core has a
    /// process or the queues are exhausted. Processes left queued afterwards
    /// accumulate one tick of wait time.
    fn select_runnable(&mut self) -> Vec<i32> {
        let mut selected = Vec::new();
        for level in 0..self.config.num_levels() {
            while selected.len() < self.config.num_cores() {
                let pid = match self.queues[level].pop_front() {
                    Some(pid) => pid,
                    None => break,
                };
                let record = self.processes.get_mut(&pid).unwrap();
                record.state = ProcessState::Running;
                if record.start_time == -1 {
                    record.start_time = self.clock;
                    record.response_time = self.clock - record.arrival_time;
                }
                selected.push(pid);
            }
        }
        for queue in &self.queues {
            for &pid in queue {
                self.processes.get_mut(&pid).unwrap().wait_ticks += 1;
            }
        }
        selected
    }

    /// One unit of execution per selected process, with one representative
    /// memory touch each.
    fn execute_selected(&mut self, selected: &[i32]) {
        for &pid in selected {
            let record = self.processes.get_mut(&pid).unwrap();
            record.remaining_cpu_time -= 1;
            record.quantum_consumed += 1;
            self.memory.access(pid, 0);
        }
    }

    /// Terminate, demote, or requeue each selected process, in selection
    /// order. Arrivals of this tick were enqueued in phase one, so a process
    /// demoted here lands behind them at the same level.
    fn dispose_selected(&mut self, selected: &[i32]) {
        for &pid in selected {
            let (remaining, quantum, level) = {
                let record = &self.processes[&pid];
                (record.remaining_cpu_time, record.quantum_consumed, record.priority_level)
            };
            if remaining <= 0 {
                let record = self.processes.get_mut(&pid).unwrap();
                record.state = ProcessState::Terminated;
                record.finish_time = self.clock + 1;
                record.quantum_consumed = 0;
                self.terminated.push(pid);
                self.memory.free(pid);
                self.retry_waiting();
            } else if quantum >= self.config.quanta()[level] {
                let new_level = (level + 1).min(self.config.num_levels() - 1);
                let record = self.processes.get_mut(&pid).unwrap();
                record.quantum_consumed = 0;
                record.priority_level = new_level;
                record.state = ProcessState::Ready;
                self.queues[new_level].push_back(pid);
            } else {
                self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
                self.queues[level].push_back(pid);
            }
        }
    }

    /// Give parked processes another chance after pages were returned to the
    /// free pool. A satisfiable waiter re-enters at level 0, in pid order.
    fn retry_waiting(&mut self) {
        let waiting: Vec<i32> = self
            .processes
            .iter()
            .filter(|(_, record)| record.state == ProcessState::Waiting)
            .map(|(&pid, _)| pid)
            .collect();
        for pid in waiting {
            let demand = self.processes[&pid].memory_demand;
            if self.memory.allocate(pid, demand) {
                info!("pid {} unparked after memory was freed", pid);
                let record = self.processes.get_mut(&pid).unwrap();
                record.state = ProcessState::Ready;
                record.priority_level = 0;
                self.queues[0].push_back(pid);
            }
        }
    }

    /// Averages over terminated processes plus the CPU-utilization ratio
    /// (ticks with at least one occupied core over elapsed ticks).
    pub fn statistics(&self) -> SchedulerStats {
        let mut total_wait = 0.0;
        let mut total_turnaround = 0.0;
        let mut total_response = 0.0;
        for pid in &self.terminated {
            let record = &self.processes[pid];
            total_wait += record.wait_ticks as f32;
            total_turnaround += (record.finish_time - record.arrival_time) as f32;
            total_response += record.response_time as f32;
        }
        let finished = self.terminated.len();
        let average = |total: f32| if finished == 0 { 0.0 } else { total / finished as f32 };
        SchedulerStats {
            finished_processes: finished,
            average_wait_time: average(total_wait),
            average_turnaround_time: average(total_turnaround),
            average_response_time: average(total_response),
            cpu_utilization: self.busy_ticks as f32 / self.clock.max(1) as f32,
            memory: self.memory.stats(),
        }
    }

    pub fn simulation_info(&self) -> SimulationInfo {
        SimulationInfo {
            num_levels: self.config.num_levels(),
            quanta: self.config.quanta().clone(),
            aging_interval: self.config.aging_interval(),
            number_of_cores: self.config.num_cores(),
            total_processes: self.processes.len(),
        }
    }

    /// Per-process timing log over every registered process, in pid order.
    pub fn process_set_log(&self) -> ProcessSetLog {
        let process_logs = self
            .processes
            .values()
            .map(|record| ProcessLog {
                pid: record.pid,
                arrival_time: record.arrival_time,
                start_time: record.start_time,
                finish_time: record.finish_time,
                response_time: record.response_time,
                wait_time: record.wait_ticks,
                turnaround_time: if record.finish_time >= 0 {
                    record.finish_time - record.arrival_time
                } else {
                    -1
                },
                state: record.state,
            })
            .collect();
        ProcessSetLog { process_logs }
    }

    pub fn is_complete(&self) -> bool {
        self.processes
            .values()
            .all(|record| record.state == ProcessState::Terminated)
    }

    pub fn clock(&self) -> i32 {
        self.clock
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn process(&self, pid: i32) -> Option<&ProcessRecord> {
        self.processes.get(&pid)
    }

    /// Pids selected in the most recent tick, in selection order.
    pub fn running(&self) -> &[i32] {
        &self.running
    }

    pub fn current_running(&self) -> Vec<i32> {
        self.dispatcher.current_running()
    }

    pub fn gantt_log(&self) -> &[GanttEntry] {
        self.dispatcher.gantt()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.memory.stats()
    }

    pub fn memory_events(&self) -> &[MemoryEvent] {
        self.memory.events()
    }
}
