/// Frequency tables over one streaming pass of the corpus: how often each
/// byte leads a bigram, and how often each ordered pair occurs.
pub struct BigramCounter {
    firsts: Vec<u64>,
    pairs: Vec<u64>,
}

impl BigramCounter {
    pub fn new() -> Self {
        BigramCounter {
            firsts: vec![0; 256],
            pairs: vec![0; 256 * 256],
        }
    }

    pub fn add_segment(&mut self, segment: &[u8]) {
        for pair in segment.windows(2) {
            self.firsts[pair[0] as usize] += 1;
            self.pairs[pair[0] as usize * 256 + pair[1] as usize] += 1;
        }
    }

    /// Total number of bigrams counted so far.
    pub fn bigrams(&self) -> u64 {
        self.firsts.iter().sum()
    }

    pub fn first_count(&self, byte: u8) -> u64 {
        self.firsts[byte as usize]
    }

    pub fn pair_count(&self, first: u8, second: u8) -> u64 {
        self.pairs[first as usize * 256 + second as usize]
    }

    /// The up to `k` most frequent leading bytes, most frequent first.
    ///
    /// Ties go to the smaller byte value, so identical corpora always
    /// rank identically.
    pub fn top_leaders(&self, k: usize) -> Vec<u8> {
        top_k(&self.firsts, k)
    }

    /// The up to `k` most frequent successors of `leader`, most frequent
    /// first, with the same tie-break as [`BigramCounter::top_leaders`].
    pub fn top_successors(&self, leader: u8, k: usize) -> Vec<u8> {
        let row = leader as usize * 256;
        top_k(&self.pairs[row..row + 256], k)
    }
}

impl Default for BigramCounter {
    fn default() -> Self {
        Self::new()
    }
}

fn top_k(counts: &[u64], k: usize) -> Vec<u8> {
    let mut ranked: Vec<(u8, u64)> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(byte, &count)| (byte as u8, count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked.into_iter().map(|(byte, _)| byte).collect()
}
