//! Simulated paged RAM with swap accounting and an LRU page cache.
//!
//! The cache is an ordered set of `(pid, page_index)` keys, least recently
//! used at the front. It serves two roles: access-recency tracking and the
//! eviction-order source when RAM has to be reclaimed. Every cache entry
//! refers to a currently resident page.
use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};

use log::{debug, warn};
use num_integer::Integer;
use serde_derive::{Deserialize, Serialize};

type PageKey = (i32, usize);

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum MemoryEvent {
    Allocated { pid: i32, pages: usize },
    AllocationFailed { pid: i32, pages_needed: usize },
    SwappedOut { pid: i32 },
    SwappedIn { pid: i32 },
    Freed { pid: i32, pages: usize },
}

/// Read-only snapshot of the page accounting.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_pages: usize,
    pub used_pages: usize,
    pub free_pages: usize,
    pub swapped_pages: usize,
    pub cache_occupancy: usize,
}

pub struct MemoryManager {
    page_size: usize,
    total_pages: usize,
    free_pages: usize,
    resident_pages: BTreeMap<i32, usize>,
    swapped_pages: BTreeMap<i32, usize>,
    cache: VecDeque<PageKey>,
    cache_capacity: usize,
    event_log: Vec<MemoryEvent>,
}

impl MemoryManager {
    pub fn new(total_ram_bytes: usize, page_size_bytes: usize, cache_capacity_pages: usize) -> Self {
        let page_size = page_size_bytes.max(1);
        let total_pages = (total_ram_bytes / page_size).max(1);
        Self {
            page_size,
            total_pages,
            free_pages: total_pages,
            resident_pages: BTreeMap::new(),
            swapped_pages: BTreeMap::new(),
            cache: VecDeque::new(),
            cache_capacity: cache_capacity_pages,
            event_log: Vec::new(),
        }
    }

    /// Allocate `bytes_requested` bytes of simulated RAM to `pid`, reclaiming
    /// pages from other owners when the free pool is short. Returns `false`
    /// only when no resident page is left to reclaim, in which case nothing
    /// but the event log has changed.
    pub fn allocate(&mut self, pid: i32, bytes_requested: usize) -> bool {
        let pages_needed = Integer::div_ceil(&bytes_requested, &self.page_size);

        self.resident_pages.entry(pid).or_insert(0);
        self.swapped_pages.entry(pid).or_insert(0);
        if pages_needed == 0 {
            return true;
        }

        while self.free_pages < pages_needed {
            if !self.reclaim_one_page() {
                warn!(
                    "allocation failed: pid={}, needed={} pages, free={}",
                    pid, pages_needed, self.free_pages
                );
                self.event_log.push(MemoryEvent::AllocationFailed { pid, pages_needed });
                return false;
            }
        }

        *self.resident_pages.get_mut(&pid).unwrap() += pages_needed;
        self.free_pages -= pages_needed;
        for page_index in 0..pages_needed {
            self.touch_cache((pid, page_index));
        }

        debug!("allocated: pid={}, pages={}, free={}", pid, pages_needed, self.free_pages);
        self.event_log.push(MemoryEvent::Allocated { pid, pages: pages_needed });
        true
    }

    /// Record a memory touch on `(pid, page_index)`, swapping the pid back in
    /// first when all of its pages were evicted.
    ///
    /// Panics if `pid` was never allocated; that is a process-lifecycle bug in
    /// the caller, not a simulated resource condition.
    pub fn access(&mut self, pid: i32, page_index: usize) {
        let resident = *self
            .resident_pages
            .get(&pid)
            .unwrap_or_else(|| panic!("access on unknown pid {}", pid));
        let swapped = self.swapped_pages[&pid];

        if resident == 0 && swapped > 0 {
            // Page the pid back in, making room first if RAM is full.
            while self.free_pages == 0 {
                self.reclaim_one_page();
            }
            *self.swapped_pages.get_mut(&pid).unwrap() -= 1;
            *self.resident_pages.get_mut(&pid).unwrap() += 1;
            self.free_pages -= 1;
            debug!("swap in: pid={}", pid);
            self.event_log.push(MemoryEvent::SwappedIn { pid });
        } else if resident == 0 {
            // A zero-byte allocation owns no pages; nothing to track.
            return;
        }

        self.touch_cache((pid, page_index));
    }

    /// Return every page owned by `pid` to the free pool and drop its cache
    /// entries. Idempotent for an already-freed pid.
    pub fn free(&mut self, pid: i32) {
        let pages = self.resident_pages.remove(&pid).unwrap_or(0);
        self.free_pages += pages;
        self.swapped_pages.remove(&pid);
        self.cache.retain(|&(owner, _)| owner != pid);

        debug!("freed: pid={}, pages={}, free={}", pid, pages, self.free_pages);
        self.event_log.push(MemoryEvent::Freed { pid, pages });
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_pages: self.total_pages,
            used_pages: self.total_pages - self.free_pages,
            free_pages: self.free_pages,
            swapped_pages: self.swapped_pages.values().sum(),
            cache_occupancy: self.cache.len(),
        }
    }

    pub fn events(&self) -> &[MemoryEvent] {
        &self.event_log
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn resident_pages(&self, pid: i32) -> usize {
        self.resident_pages.get(&pid).copied().unwrap_or(0)
    }

    pub fn swapped_pages(&self, pid: i32) -> usize {
        self.swapped_pages.get(&pid).copied().unwrap_or(0)
    }

    /// Swap one resident page out to free its RAM slot. The victim page is the
    /// least recently used cache entry; with an empty cache, the owner with
    /// the most resident pages loses one instead. Returns `false` when no
    /// resident page exists at all.
    fn reclaim_one_page(&mut self) -> bool {
        let victim_pid = if let Some((pid, _)) = self.cache.pop_front() {
            pid
        } else {
            match self
                .resident_pages
                .iter()
                .filter(|(_, &count)| count > 0)
                .max_by_key(|(&pid, &count)| (count, Reverse(pid)))
            {
                Some((&pid, _)) => pid,
                None => return false,
            }
        };

        let resident = self.resident_pages.get_mut(&victim_pid).unwrap();
        debug_assert!(*resident > 0, "cache entry for a non-resident page");
        *resident -= 1;
        *self.swapped_pages.entry(victim_pid).or_insert(0) += 1;
        self.free_pages += 1;
        debug!("swap out: pid={}", victim_pid);
        self.event_log.push(MemoryEvent::SwappedOut { pid: victim_pid });
        true
    }

    /// Move `key` to the most recently used position, inserting it if absent.
    /// A capacity overflow drops the least recently used entry; that page
    /// stays resident, only its recency tracking is lost.
    fn touch_cache(&mut self, key: PageKey) {
        if let Some(position) = self.cache.iter().position(|&entry| entry == key) {
            self.cache.remove(position);
            self.cache.push_back(key);
        } else {
            self.cache.push_back(key);
            if self.cache.len() > self.cache_capacity {
                self.cache.pop_front();
            }
        }
    }
}
