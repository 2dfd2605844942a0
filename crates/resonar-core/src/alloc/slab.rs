use crate::profiling::profile_function;
use std::num::NonZeroU64;

/// Generational index into a [`Slab`].
///
/// The upper 32 bits hold the generation, the lower 32 bits the slot index
/// plus one so the value is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexSlot(NonZeroU64);

impl IndexSlot {
    pub fn new(generation: u32, idx: u32) -> Self {
        let raw = ((generation as u64) << 32) | (idx as u64 + 1);
        // idx + 1 is at least 1, so raw is never zero.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    pub fn generation(&self) -> u32 {
        (self.0.get() >> 32) as u32
    }

    pub fn index(&self) -> u32 {
        (self.0.get() & u32::MAX as u64) as u32 - 1
    }
}

struct Entry<T> {
    generation: u32,
    data: Option<T>,
}

/// Arena with stable slots and a free list.
///
/// Values never move between slots once pushed, and a removed slot is only
/// handed out again with a bumped generation, so stale [`IndexSlot`]s are
/// detected instead of aliasing the new occupant.
pub struct Slab<T> {
    vec: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slab<T> {
    pub const fn new() -> Self {
        Self {
            vec: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn push(&mut self, data: T) -> IndexSlot {
        profile_function!();
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let entry = &mut self.vec[idx as usize];
            entry.data = Some(data);
            IndexSlot::new(entry.generation, idx)
        } else {
            let idx = self.vec.len() as u32;
            self.vec.push(Entry {
                generation: 0,
                data: Some(data),
            });
            IndexSlot::new(0, idx)
        }
    }

    fn entry(&self, idx: IndexSlot) -> Option<&Entry<T>> {
        self.vec
            .get(idx.index() as usize)
            .filter(|entry| entry.generation == idx.generation())
    }

    pub fn try_get(&self, idx: IndexSlot) -> Option<&T> {
        self.entry(idx).and_then(|entry| entry.data.as_ref())
    }

    pub fn try_get_mut(&mut self, idx: IndexSlot) -> Option<&mut T> {
        self.vec
            .get_mut(idx.index() as usize)
            .filter(|entry| entry.generation == idx.generation())
            .and_then(|entry| entry.data.as_mut())
    }

    pub fn contains(&self, idx: IndexSlot) -> bool {
        self.try_get(idx).is_some()
    }

    /// Remove the value at `idx`, returning `None` for stale or unknown slots.
    pub fn remove(&mut self, idx: IndexSlot) -> Option<T> {
        profile_function!();
        let index = idx.index();
        let entry = self
            .vec
            .get_mut(index as usize)
            .filter(|entry| entry.generation == idx.generation())?;
        let data = entry.data.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(data)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndexSlot, &T)> {
        self.vec.iter().enumerate().filter_map(|(idx, entry)| {
            entry
                .data
                .as_ref()
                .map(|data| (IndexSlot::new(entry.generation, idx as u32), data))
        })
    }
}

static_assertions::assert_eq_size!(IndexSlot, Option<IndexSlot>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slab_push() {
        let mut slab = Slab::<u8>::new();
        let idx = slab.push(15);
        assert_eq!(idx.generation(), 0);
        assert_eq!(idx.index(), 0);
        assert_eq!(slab.try_get(idx), Some(&15));
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn test_slab_stale_slot() {
        let mut slab = Slab::<u8>::new();
        let _ = slab.push(15);
        let stale = IndexSlot::new(1, 0);
        assert_eq!(slab.try_get(stale), None);
        assert_eq!(slab.remove(stale), None);
    }

    #[test]
    fn test_slab_remove_reuses_slot() {
        let mut slab = Slab::<u8>::new();
        let idx = slab.push(15);
        assert_eq!(slab.remove(idx), Some(15));
        assert!(slab.is_empty());
        let new_idx = slab.push(45);
        assert_eq!(idx.index(), new_idx.index());
        assert_ne!(idx.generation(), new_idx.generation());
        assert_eq!(slab.try_get(idx), None);
        assert_eq!(slab.remove(idx), None);
    }

    #[test]
    fn test_slab_iter_skips_free() {
        let mut slab = Slab::<u8>::new();
        let slots: Vec<_> = (0..100).map(|i| slab.push(i)).collect();
        slab.remove(slots[0]);
        slab.remove(slots[1]);
        let collected: Vec<_> = slab.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected.len(), 98);
        for (offset, value) in collected.into_iter().enumerate() {
            assert_eq!(value, offset as u8 + 2);
        }
    }

    #[test]
    fn test_slab_slot_survives_growth() {
        let mut slab = Slab::<u32>::new();
        let first = slab.push(7);
        for i in 0..1000 {
            slab.push(i);
        }
        assert_eq!(slab.try_get(first), Some(&7));
        assert_eq!(slab.len(), 1001);
    }
}
