/// Fixed-length set of cell indices packed into 32-bit words.
///
/// Bit `k` lives at position `k % 32` of word `k / 32`, which is also the layout
/// the device kernel reads and writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u32>,
    len: usize,
}

impl BitSet {
    pub const BITS_IN_WORD: usize = u32::BITS as usize;

    /// Creates a set able to hold indices `0..len`, all cleared.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(Self::BITS_IN_WORD)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, k: usize) -> bool {
        debug_assert!(k < self.len);
        self.words[k / Self::BITS_IN_WORD] >> (k % Self::BITS_IN_WORD) & 1 != 0
    }

    pub fn set(&mut self, k: usize, value: bool) {
        debug_assert!(k < self.len);
        let mask = 1 << (k % Self::BITS_IN_WORD);
        let word = &mut self.words[k / Self::BITS_IN_WORD];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn insert(&mut self, k: usize) {
        debug_assert!(k < self.len);
        self.words[k / Self::BITS_IN_WORD] |= 1 << (k % Self::BITS_IN_WORD);
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// `self |= other`; both sets must have the same length.
    pub fn union_with(&mut self, other: &BitSet) {
        debug_assert_eq!(self.len, other.len);
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst |= *src;
        }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Overwrites the set with packed words; missing words read as zero and
    /// bits past `len` are dropped.
    pub fn load_words(&mut self, src: &[u32]) {
        let n = self.words.len().min(src.len());
        self.words[..n].copy_from_slice(&src[..n]);
        self.words[n..].fill(0);
        let tail = self.len % Self::BITS_IN_WORD;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1 << tail) - 1;
            }
        }
    }

    /// Set indices in ascending order.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

pub struct Ones<'a> {
    words: &'a [u32],
    word_idx: usize,
    current: u32,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_idx * BitSet::BITS_IN_WORD + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}
