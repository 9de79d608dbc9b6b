//! Route slot bit sets.
//!
//! Every constrained route at a path node occupies one slot. Dimension
//! stores map constraint values to the set of slots declaring them, and
//! lookups narrow candidates with set intersection.

const BITS: usize = u64::BITS as usize;

/// A growable set of route slot indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMask {
    words: Vec<u64>,
}

impl RouteMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mask holding exactly one slot.
    pub fn single(slot: usize) -> Self {
        let mut mask = Self::new();
        mask.insert(slot);
        mask
    }

    pub fn insert(&mut self, slot: usize) {
        let word = slot / BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (slot % BITS);
    }

    pub fn remove(&mut self, slot: usize) {
        if let Some(word) = self.words.get_mut(slot / BITS) {
            *word &= !(1u64 << (slot % BITS));
        }
        self.trim();
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.words
            .get(slot / BITS)
            .map(|word| word & (1u64 << (slot % BITS)) != 0)
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Slots present in both masks.
    pub fn intersection(&self, other: &RouteMask) -> RouteMask {
        let mut words: Vec<u64> = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| a & b)
            .collect();
        while words.last() == Some(&0) {
            words.pop();
        }
        RouteMask { words }
    }

    /// Adds every slot of `other` to this mask.
    pub fn union_with(&mut self, other: &RouteMask) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= b;
        }
    }

    /// Removes every slot of `other` from this mask.
    pub fn difference_with(&mut self, other: &RouteMask) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !b;
        }
        self.trim();
    }

    /// Iterates slot indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            let mut bits = *word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let offset = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(i * BITS + offset)
            })
        })
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<usize> for RouteMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = RouteMask::new();
        for slot in iter {
            mask.insert(slot);
        }
        mask
    }
}
