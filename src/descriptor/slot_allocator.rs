use tracing::error;

use crate::descriptor::descriptor_set::{DescriptorInfo, DescriptorType, DescriptorWriteInfo};
use crate::descriptor::DescriptorSet;

/// An allocated descriptor-table slot plus the version it was allocated under. Stays valid
/// until the slot is freed and reallocated to someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: u32,
    pub version: u64,
}

/// Versioned free-list allocator for a single bindless descriptor kind (one binding index, one
/// fixed capacity). Accumulates pending writes which are only pushed to the GPU descriptor set
/// on [`Self::flush`].
#[derive(Debug)]
pub struct DescriptorSlotAllocator {
    binding: u32,
    ty: DescriptorType,
    capacity: u32,
    free_list: Vec<u32>,
    versions: Vec<u64>,
    pending: Vec<DescriptorWriteInfo>,
}

impl DescriptorSlotAllocator {
    pub fn new(binding: u32, ty: DescriptorType, capacity: u32) -> Self {
        Self {
            binding,
            ty,
            capacity,
            free_list: (0..capacity).rev().collect(),
            versions: vec![0; capacity as usize],
            pending: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Pops the next free slot, bumps its version, and queues a pending write that will bind
    /// `descriptor` at `dstArrayElement = slot` the next time [`Self::flush`] runs.
    pub fn allocate(&mut self, descriptor: DescriptorInfo) -> Option<Slot> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                error!("failed to allocate a slot: descriptor allocator exhausted (capacity {})", self.capacity);
                return None;
            }
        };
        self.versions[index as usize] += 1;
        let slot = Slot {
            index,
            version: self.versions[index as usize],
        };
        self.pending.push(
            DescriptorWriteInfo::default()
                .slot(index)
                .binding(self.binding)
                .ty(self.ty)
                .push_descriptor(descriptor),
        );
        Some(slot)
    }

    /// Idempotent: pushes `slot` back onto the free list unless already free. Does not bump the
    /// version; that happens lazily on the next allocate so a cached `Slot` with the old version
    /// reads as stale.
    pub fn free(&mut self, index: u32) {
        if index >= self.capacity {
            return;
        }
        if !self.free_list.contains(&index) {
            self.free_list.push(index);
        }
    }

    pub fn is_valid(&self, slot: Slot) -> bool {
        slot.index < self.capacity && self.versions[slot.index as usize] == slot.version
    }

    /// Finalizes every pending write against `descriptor_set` in one update-descriptor-sets call.
    pub fn flush(&mut self, descriptor_set: &DescriptorSet) {
        if self.pending.is_empty() {
            return;
        }
        descriptor_set.write(&self.pending);
        self.pending.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn info() -> DescriptorInfo {
        DescriptorInfo::Buffer(Default::default())
    }

    #[test]
    fn allocate_fills_free_list_in_order() {
        let mut allocator = DescriptorSlotAllocator::new(0, DescriptorType::StorageBuffer, 4);
        let first = allocator.allocate(info()).unwrap();
        let second = allocator.allocate(info()).unwrap();
        assert_ne!(first.index, second.index);
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 1);
    }

    #[test]
    fn exhaustion_returns_none_past_capacity() {
        let mut allocator = DescriptorSlotAllocator::new(0, DescriptorType::StorageBuffer, 4);
        for _ in 0..4 {
            assert!(allocator.allocate(info()).is_some());
        }
        assert!(allocator.allocate(info()).is_none());
    }

    #[test]
    fn freed_slot_is_stale_after_reallocation() {
        let mut allocator = DescriptorSlotAllocator::new(0, DescriptorType::StorageBuffer, 4);
        let slot = allocator.allocate(info()).unwrap();
        assert!(allocator.is_valid(slot));
        allocator.free(slot.index);
        let reallocated = allocator.allocate(info()).unwrap();
        assert_eq!(reallocated.index, slot.index);
        assert_ne!(reallocated.version, slot.version);
        assert!(!allocator.is_valid(slot));
        assert!(allocator.is_valid(reallocated));
    }

    #[test]
    fn free_is_idempotent() {
        let mut allocator = DescriptorSlotAllocator::new(0, DescriptorType::StorageBuffer, 2);
        let slot = allocator.allocate(info()).unwrap();
        allocator.free(slot.index);
        allocator.free(slot.index);
        assert_eq!(allocator.free_list.len(), 2);
    }

    #[test]
    fn free_out_of_range_is_ignored() {
        let mut allocator = DescriptorSlotAllocator::new(0, DescriptorType::StorageBuffer, 2);
        allocator.free(99);
        assert_eq!(allocator.free_list.len(), 2);
    }
}
