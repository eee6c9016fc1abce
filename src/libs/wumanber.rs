use std::collections::HashMap;

//----------------------------
// WuManber
//----------------------------
/// Wu-Manber multi-pattern exact search.
///
/// Built once over a set of distinct patterns, then queried per text
/// for the leftmost occurrence of any pattern. Shifts are derived from
/// the last block of the first `m` characters of every pattern, where
/// `m` is the minimum pattern length, so search skips most of the text
/// without touching the pattern set.
///
/// ```
/// # use criscan::WuManber;
/// let wm = WuManber::new(&["GATTACA".to_string(), "TTTTCC".to_string()]);
/// assert_eq!(wm.search_first("AAGATTACAAA"), Some((0, 2)));
/// assert_eq!(wm.search_first("AATTTTCCAAA"), Some((1, 2)));
/// assert_eq!(wm.search_first("ACGTACGTACGT"), None);
/// ```
#[derive(Debug, Clone)]
pub struct WuManber {
    patterns: Vec<String>,
    min_len: usize,
    block: usize,
    default_shift: usize,
    shift: HashMap<u16, usize>,
    buckets: HashMap<u16, Vec<usize>>,
}

fn block_key(bytes: &[u8]) -> u16 {
    if bytes.len() == 1 {
        bytes[0] as u16
    } else {
        ((bytes[0] as u16) << 8) | bytes[1] as u16
    }
}

impl WuManber {
    /// One-shot build over distinct nonempty patterns
    pub fn new(patterns: &[String]) -> Self {
        debug_assert!(!patterns.is_empty());
        debug_assert!(patterns.iter().all(|p| !p.is_empty()));

        let min_len = patterns.iter().map(|p| p.len()).min().unwrap_or(0);
        let block = min_len.min(2).max(1);
        let default_shift = min_len + 1 - block;

        let mut shift: HashMap<u16, usize> = HashMap::new();
        let mut buckets: HashMap<u16, Vec<usize>> = HashMap::new();

        for (idx, pat) in patterns.iter().enumerate() {
            let bytes = pat.as_bytes();
            for end in (block - 1)..min_len {
                let key = block_key(&bytes[end + 1 - block..=end]);
                let value = min_len - 1 - end;
                shift
                    .entry(key)
                    .and_modify(|s| *s = (*s).min(value))
                    .or_insert(value);
            }
            let tail = block_key(&bytes[min_len - block..min_len]);
            buckets.entry(tail).or_default().push(idx);
        }

        Self {
            patterns: patterns.to_vec(),
            min_len,
            block,
            default_shift,
            shift,
            buckets,
        }
    }

    pub fn pattern(&self, idx: usize) -> &str {
        &self.patterns[idx]
    }

    /// Leftmost occurrence of any pattern: `(pattern_index, offset)`.
    /// Ties at the same offset go to the lowest pattern index.
    pub fn search_first(&self, text: &str) -> Option<(usize, usize)> {
        let text = text.as_bytes();
        let n = text.len();
        let m = self.min_len;
        if m == 0 || n < m {
            return None;
        }

        let mut pos = m - 1;
        while pos < n {
            let key = block_key(&text[pos + 1 - self.block..=pos]);
            let skip = *self.shift.get(&key).unwrap_or(&self.default_shift);
            if skip > 0 {
                pos += skip;
                continue;
            }

            let start = pos + 1 - m;
            for &idx in self.buckets.get(&key).into_iter().flatten() {
                let pat = self.patterns[idx].as_bytes();
                if start + pat.len() <= n && &text[start..start + pat.len()] == pat {
                    return Some((idx, start));
                }
            }
            pos += 1;
        }
        None
    }
}
