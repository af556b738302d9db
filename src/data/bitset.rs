/// Occupancy of symbol table slots.
///
/// A set bit marks a live slot. Allocation takes the lowest clear bit,
/// so freed slots are reused before the table grows.
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    data: Vec<usize>,
    count: usize,
}

impl BitSet {
    pub fn new() -> Self {
        Default::default()
    }

    const BITS_PER_WORD: usize = std::mem::size_of::<usize>() * 8;

    fn find_first_zero(&self) -> usize {
        for (idx, word) in self.data.iter().enumerate() {
            let z = word.trailing_ones() as usize;
            if z < Self::BITS_PER_WORD {
                return (idx * Self::BITS_PER_WORD) + z;
            }
        }
        self.data.len() * Self::BITS_PER_WORD
    }

    /// Mark the lowest free slot as used, and return it.
    pub fn claim(&mut self) -> usize {
        let idx = self.find_first_zero();
        self.set(idx);
        idx
    }

    pub fn get(&self, idx: usize) -> bool {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        match self.data.get(word) {
            Some(w) => w & (1 << bit) != 0,
            None => false,
        }
    }

    fn set(&mut self, idx: usize) {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        if word >= self.data.len() {
            self.data.resize(word + 1, 0);
        }
        if self.data[word] & (1 << bit) == 0 {
            self.count += 1;
        }
        self.data[word] |= 1 << bit;
    }

    /// Release a slot. Releasing a free slot does nothing.
    pub fn release(&mut self, idx: usize) {
        if !self.get(idx) {
            return;
        }
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        self.data[word] &= !(1 << bit);
        self.count -= 1;
    }

    /// Number of live slots.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::BitSet;

    #[test]
    fn claims_are_dense() {
        let mut bs = BitSet::new();
        for i in 0..200usize {
            assert_eq!(bs.claim(), i);
        }
        assert_eq!(bs.count(), 200);
        for i in 0..200usize {
            assert!(bs.get(i));
        }
        assert!(!bs.get(200));
        assert!(!bs.get(100_000));
    }

    #[test]
    fn released_slots_are_reused() {
        let mut bs = BitSet::new();
        for _ in 0..130 {
            bs.claim();
        }
        bs.release(70);
        bs.release(3);
        assert_eq!(bs.count(), 128);
        assert_eq!(bs.claim(), 3);
        assert_eq!(bs.claim(), 70);
        assert_eq!(bs.claim(), 130);

        bs.release(5);
        bs.release(5);
        assert_eq!(bs.count(), 130);
    }
}
