// src/engine/resources.rs

//! Slot and memory accounting for admission control.

use tracing::{debug, trace};

use crate::dag::ResourceRequest;

/// Capacity configuration for a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_slots: u32,
    /// Whether memory requests are accounted at all.
    pub track_memory: bool,
    /// Memory cap in GiB; `None` means unbounded (still accounted when
    /// tracking is on).
    pub max_memory_gib: Option<u64>,
}

/// Tracks reserved slots and memory against fixed maxima.
///
/// The pool is owned by the engine core, which processes one event at a
/// time, so every reservation and release is atomic with respect to
/// concurrent task completions.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    limits: PoolLimits,
    reserved_slots: u32,
    reserved_memory_gib: u64,
}

impl ResourcePool {
    pub fn new(limits: PoolLimits) -> Self {
        Self {
            limits,
            reserved_slots: 0,
            reserved_memory_gib: 0,
        }
    }

    pub fn limits(&self) -> PoolLimits {
        self.limits
    }

    pub fn reserved_slots(&self) -> u32 {
        self.reserved_slots
    }

    pub fn reserved_memory_gib(&self) -> u64 {
        self.reserved_memory_gib
    }

    /// Whether `request` could be admitted by an otherwise empty pool.
    pub fn fits(&self, request: &ResourceRequest) -> bool {
        request.slots <= self.limits.max_slots
            && match (self.tracked_memory(request), self.limits.max_memory_gib) {
                (Some(mem), Some(max)) => mem <= max,
                _ => true,
            }
    }

    /// Reserve `request` if it fits in the remaining capacity.
    ///
    /// Non-blocking: returns `false` and leaves the pool untouched otherwise.
    pub fn try_reserve(&mut self, request: &ResourceRequest) -> bool {
        let slots = self.reserved_slots.saturating_add(request.slots);
        if slots > self.limits.max_slots {
            trace!(
                requested = request.slots,
                reserved = self.reserved_slots,
                max = self.limits.max_slots,
                "not enough free slots"
            );
            return false;
        }

        let memory = self.tracked_memory(request).unwrap_or(0);
        let total_memory = self.reserved_memory_gib.saturating_add(memory);
        if let Some(max) = self.limits.max_memory_gib {
            if self.limits.track_memory && total_memory > max {
                trace!(
                    requested = memory,
                    reserved = self.reserved_memory_gib,
                    max,
                    "not enough free memory"
                );
                return false;
            }
        }

        self.reserved_slots = slots;
        self.reserved_memory_gib = total_memory;
        debug!(
            slots = self.reserved_slots,
            memory_gib = self.reserved_memory_gib,
            "reserved resources"
        );
        true
    }

    /// Return a previous reservation to the pool.
    pub fn release(&mut self, request: &ResourceRequest) {
        let memory = self.tracked_memory(request).unwrap_or(0);
        self.reserved_slots = self.reserved_slots.saturating_sub(request.slots);
        self.reserved_memory_gib = self.reserved_memory_gib.saturating_sub(memory);
        debug!(
            slots = self.reserved_slots,
            memory_gib = self.reserved_memory_gib,
            "released resources"
        );
    }

    fn tracked_memory(&self, request: &ResourceRequest) -> Option<u64> {
        if self.limits.track_memory {
            request.memory_gib
        } else {
            None
        }
    }
}
