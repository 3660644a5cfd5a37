//! Aligned attribute pool
//!
//! Per-particle attribute records live in fixed-stride byte buffers, one
//! buffer per distinct record size. Freed slots go on a free list and are
//! handed out again (LIFO) before a buffer grows.
//!
//! Every buffer is backed by 16-byte aligned blocks and every stride is a
//! multiple of 16, so the record at `index * stride` is itself 16-byte aligned
//! and any `Pod` type with alignment ≤ 16 can be viewed in place.
//!
//! # Borrowing
//!
//! `data`/`data_mut` hand out slices borrowed from the pool. A later `alloc`
//! on the same pool may grow (and move) the backing buffer, so the borrow
//! checker forbids holding a record across it. Keep indices, not references.
//!
//! # Threading
//!
//! A pool belongs to one emitter instance and is driven by one simulation
//! thread. Nothing here locks.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use crate::consts::{MAX_RECORD_SIZE, POOL_ALIGNMENT};

// ============================================================================
// Aligned Backing Block
// ============================================================================

/// One 16-byte aligned unit of backing storage.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AlignedBlock([u8; 16]);

// SAFETY: a plain byte array with no padding; 16 bytes at align 16.
unsafe impl Zeroable for AlignedBlock {}
// SAFETY: every bit pattern is a valid `[u8; 16]`.
unsafe impl Pod for AlignedBlock {}

const BLOCK_SIZE: usize = std::mem::size_of::<AlignedBlock>();

// ============================================================================
// Particle Data Set
// ============================================================================

/// Fixed-stride storage for records of a single size.
#[derive(Debug, Clone)]
pub struct ParticleDataSet {
    /// Aligned byte size of one record
    stride: u32,
    /// Backing storage, `slot_count * stride` bytes
    raw_data: Vec<AlignedBlock>,
    /// Reclaimed slot indices (reused LIFO)
    free_list: Vec<u32>,
}

impl ParticleDataSet {
    /// Create an empty set for records of `data_size` bytes.
    pub fn new(data_size: u32) -> Self {
        Self {
            stride: ParticleDataPool::align_size(data_size),
            raw_data: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Aligned record size in bytes
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Number of slots ever allocated (active + free)
    #[inline]
    pub fn slot_count(&self) -> u32 {
        (self.raw_data.len() * BLOCK_SIZE / self.stride as usize) as u32
    }

    /// Hand out a slot, reusing a freed one before growing the buffer.
    ///
    /// The returned record holds whatever bytes it held before; the caller
    /// initialises it.
    pub fn alloc(&mut self) -> u32 {
        if let Some(index) = self.free_list.pop() {
            return index;
        }
        let index = self.slot_count();
        let blocks = self.stride as usize / BLOCK_SIZE;
        self.raw_data
            .resize(self.raw_data.len() + blocks, AlignedBlock::default());
        index
    }

    /// Return a slot to the free list. The buffer never shrinks.
    pub fn free(&mut self, index: u32) {
        debug_assert!(
            index < self.slot_count(),
            "free of slot {index} outside set of {} slots",
            self.slot_count()
        );
        debug_assert!(
            !self.free_list.contains(&index),
            "double free of slot {index}"
        );
        self.free_list.push(index);
    }

    /// Record bytes at `index`, or `None` past the end of the buffer
    pub fn at(&self, index: u32) -> Option<&[u8]> {
        let range = self.byte_range(index);
        self.raw_data().get(range)
    }

    /// Mutable record bytes at `index`
    pub fn at_mut(&mut self, index: u32) -> Option<&mut [u8]> {
        let range = self.byte_range(index);
        bytemuck::cast_slice_mut::<AlignedBlock, u8>(&mut self.raw_data).get_mut(range)
    }

    /// Allocated slots minus free slots
    #[inline]
    pub fn active_size(&self) -> u32 {
        self.slot_count() - self.free_list.len() as u32
    }

    /// Replace the whole buffer with a raw byte image.
    ///
    /// Every whole record in `src` becomes an active slot; a trailing partial
    /// record is dropped. The free list is cleared.
    pub fn set_data(&mut self, src: &[u8]) {
        let stride = self.stride as usize;
        let records = src.len() / stride;
        let bytes = records * stride;

        self.raw_data = vec![AlignedBlock::default(); bytes / BLOCK_SIZE];
        bytemuck::cast_slice_mut::<AlignedBlock, u8>(&mut self.raw_data)
            .copy_from_slice(&src[..bytes]);
        self.free_list.clear();
    }

    /// The whole backing buffer as bytes
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.raw_data)
    }

    /// Currently free slot indices
    #[inline]
    pub fn free_list(&self) -> &[u32] {
        &self.free_list
    }

    fn byte_range(&self, index: u32) -> std::ops::Range<usize> {
        let start = index as usize * self.stride as usize;
        start..start + self.stride as usize
    }
}

// ============================================================================
// Particle Data Pool
// ============================================================================

/// All attribute sets of one particle-system instance, keyed by record size.
///
/// An index from `alloc(size)` is only meaningful to `data(size, ..)` and
/// `free(size, ..)` with the same `size`.
#[derive(Debug, Clone, Default)]
pub struct ParticleDataPool {
    sets: BTreeMap<u32, ParticleDataSet>,
}

impl ParticleDataPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round `size` up to the pool alignment (16 bytes)
    #[inline]
    pub const fn align_size(size: u32) -> u32 {
        (size + POOL_ALIGNMENT - 1) & !(POOL_ALIGNMENT - 1)
    }

    /// Allocate a slot for a record of `size` bytes, creating its set on first use.
    pub fn alloc(&mut self, size: u32) -> u32 {
        debug_assert!(size > 0, "zero-size pool allocation");
        debug_assert!(
            size <= MAX_RECORD_SIZE,
            "pool record of {size} bytes exceeds {MAX_RECORD_SIZE}"
        );
        self.sets
            .entry(size)
            .or_insert_with(|| {
                log::debug!(
                    "Creating particle data set: size={} stride={}",
                    size,
                    Self::align_size(size)
                );
                ParticleDataSet::new(size)
            })
            .alloc()
    }

    /// Return slot `index` of the `size` set to its free list
    pub fn free(&mut self, size: u32, index: u32) {
        match self.sets.get_mut(&size) {
            Some(set) => set.free(index),
            None => debug_assert!(false, "free from unknown set of size {size}"),
        }
    }

    /// Record bytes (`stride` long) for slot `index` of the `size` set
    pub fn data(&self, size: u32, index: u32) -> Option<&[u8]> {
        self.sets.get(&size).and_then(|set| set.at(index))
    }

    pub fn data_mut(&mut self, size: u32, index: u32) -> Option<&mut [u8]> {
        self.sets.get_mut(&size).and_then(|set| set.at_mut(index))
    }

    /// Allocate a slot sized for `T` and copy `value` into it.
    pub fn alloc_t<T: Pod>(&mut self, value: &T) -> u32 {
        let size = Self::record_size::<T>();
        let index = self.alloc(size);
        if let Some(bytes) = self.data_mut(size, index) {
            bytes[..size as usize].copy_from_slice(bytemuck::bytes_of(value));
        }
        index
    }

    /// View slot `index` of the `T`-sized set as a `T`
    pub fn data_t<T: Pod>(&self, index: u32) -> Option<&T> {
        let size = Self::record_size::<T>();
        self.data(size, index)
            .map(|bytes| bytemuck::from_bytes(&bytes[..size as usize]))
    }

    pub fn data_t_mut<T: Pod>(&mut self, index: u32) -> Option<&mut T> {
        let size = Self::record_size::<T>();
        self.data_mut(size, index)
            .map(|bytes| bytemuck::from_bytes_mut(&mut bytes[..size as usize]))
    }

    /// Free a slot allocated with `alloc_t::<T>`
    pub fn free_t<T: Pod>(&mut self, index: u32) {
        self.free(Self::record_size::<T>(), index);
    }

    /// Active records in the `size` set (0 when the set does not exist)
    pub fn active_size(&self, size: u32) -> u32 {
        self.sets.get(&size).map_or(0, ParticleDataSet::active_size)
    }

    /// Replace the `size` set with a raw byte image (creating it if needed)
    pub fn emplace_data(&mut self, size: u32, data: &[u8]) {
        self.sets
            .entry(size)
            .or_insert_with(|| ParticleDataSet::new(size))
            .set_data(data);
    }

    /// Deep-copy every set into `target`, replacing what it held
    pub fn clone_into(&self, target: &mut ParticleDataPool) {
        if !target.sets.is_empty() {
            log::debug!("Clone target held {} sets, replacing", target.sets.len());
        }
        target.sets.clone_from(&self.sets);
    }

    /// Drop every set
    pub fn reset(&mut self) {
        log::debug!("Resetting particle data pool ({} sets)", self.sets.len());
        self.sets.clear();
    }

    /// All sets, ordered by record size
    pub fn data_sets(&self) -> &BTreeMap<u32, ParticleDataSet> {
        &self.sets
    }

    fn record_size<T: Pod>() -> u32 {
        debug_assert!(
            std::mem::align_of::<T>() <= POOL_ALIGNMENT as usize,
            "pooled type alignment exceeds {POOL_ALIGNMENT}"
        );
        std::mem::size_of::<T>() as u32
    }
}

// ============================================================================
// Tests
// ============================================================================
