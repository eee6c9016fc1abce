use std::collections::HashMap;

use anyhow::bail;
use levenshtein::levenshtein;
use log::debug;

use crate::libs::matcher::{BitParallel, BoyerMoore, RepeatMatcher};
use crate::libs::nt::base_counts;
use crate::libs::read::{RawRead, ReadRecord, RepeatArray};

// --------------------------------------------------------------------
// HARD CODED PARAMS FOR DR FILTERING
// --------------------------------------------------------------------
/// A repeat with more than this fraction of one base is noise
pub const LOW_COMPLEXITY_THRESHOLD: f64 = 0.75;
/// A repeat this similar to one of its spacers is a collapsed tandem
/// repeat, not a CRISPR
pub const REPEAT_SPACER_MAX_SIMILARITY: f64 = 0.82;
/// Spacer lengths within one array may differ by at most this many bases
pub const SPACER_LENGTH_DIFF: usize = 12;
/// No k-mer may account for more than this fraction of a repeat's
/// k-mer windows
pub const KMER_MAX_ABUNDANCE: f64 = 0.23;

//----------------------------
// SearchParams
//----------------------------
/// Tunable parameters of the repeat search. Defaults mirror the sizes
/// of biological direct repeats and spacers.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub min_repeat_len: usize,
    pub max_repeat_len: usize,
    pub min_spacer_len: usize,
    pub max_spacer_len: usize,
    /// seed window width `w`
    pub window_len: usize,
    /// slack around the projected position when scanning right
    pub scan_range: usize,
    /// minimum occurrences per read to accept an array
    pub min_seed_count: usize,
    /// substitutions tolerated when placing seeds
    pub max_mismatches: u32,
    /// k used by the abundant-k-mer gate
    pub kmer_size: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_repeat_len: 23,
            max_repeat_len: 47,
            min_spacer_len: 26,
            max_spacer_len: 50,
            window_len: 8,
            scan_range: 30,
            min_seed_count: 3,
            max_mismatches: 0,
            kmer_size: 7,
        }
    }
}

impl SearchParams {
    /// Reject inconsistent settings before any input is opened
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_repeat_len > self.max_repeat_len {
            bail!(
                "min repeat length {} exceeds max repeat length {}",
                self.min_repeat_len,
                self.max_repeat_len
            );
        }
        if self.min_spacer_len > self.max_spacer_len {
            bail!(
                "min spacer length {} exceeds max spacer length {}",
                self.min_spacer_len,
                self.max_spacer_len
            );
        }
        if self.window_len > self.min_repeat_len / 2 {
            bail!(
                "search window {} exceeds half the min repeat length {}",
                self.window_len,
                self.min_repeat_len
            );
        }
        if self.window_len == 0 {
            bail!("search window must be nonzero");
        }
        Ok(())
    }

    /// The matcher pass 1 runs on: exact when no mismatches are
    /// allowed, bit-parallel otherwise
    pub fn matcher(&self) -> Box<dyn RepeatMatcher> {
        if self.max_mismatches == 0 {
            Box::new(BoyerMoore)
        } else {
            Box::new(BitParallel {
                max_mismatches: self.max_mismatches,
            })
        }
    }
}

//----------------------------
// SingleReadFinder
//----------------------------
/// Discovers a repeat array within a single read: windowed seeding,
/// scan-right extension, column-agreement length recovery, QC.
pub struct SingleReadFinder {
    params: SearchParams,
    matcher: Box<dyn RepeatMatcher>,
}

struct Candidate {
    positions: RepeatArray,
    seed_count: usize,
}

impl SingleReadFinder {
    pub fn new(params: SearchParams) -> Self {
        let matcher = params.matcher();
        Self { params, matcher }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Search one read; `Some` carries the read with its repeat array
    pub fn find(&self, read: &RawRead) -> Option<ReadRecord> {
        let p = &self.params;
        let bases = &read.bases;
        let len = bases.len();

        let step = (p.min_repeat_len as isize - 2 * p.window_len as isize + 1).max(1) as usize;
        let seed_end =
            len as isize - (p.max_repeat_len + p.max_spacer_len + p.window_len) as isize;

        let mut best: Option<Candidate> = None;
        let mut i = 0usize;
        while (i as isize) <= seed_end {
            if let Some(cand) = self.seed_at(bases, i) {
                let jump = cand.positions.last().map(|(_, e)| e).unwrap_or(i + step);
                best = match best {
                    Some(old) if !Self::beats(&cand, &old) => Some(old),
                    _ => Some(cand),
                };
                i = jump.max(i + step);
                continue;
            }
            i += step;
        }

        best.map(|cand| ReadRecord::new(read.clone(), cand.positions))
    }

    /// Later candidates must strictly beat the incumbent: more seeds,
    /// then more covered bases; the leftmost wins all remaining ties
    fn beats(challenger: &Candidate, incumbent: &Candidate) -> bool {
        (challenger.seed_count, challenger.positions.covered_len())
            > (incumbent.seed_count, incumbent.positions.covered_len())
    }

    /// Attempt to grow a full array from a seed window at `i`
    fn seed_at(&self, bases: &str, i: usize) -> Option<Candidate> {
        let p = &self.params;
        let len = bases.len();
        let w = p.window_len;
        let pattern = &bases[i..i + w];

        // the earliest and latest points the partner occurrence can start
        let look_lo = i + p.min_repeat_len + p.min_spacer_len;
        let look_hi = (i + p.max_repeat_len + p.max_spacer_len + w).min(len);
        if look_lo + w > look_hi {
            return None;
        }

        let hit = self.matcher.find(&bases[look_lo..look_hi], pattern)?;
        let mut starts = vec![i, look_lo + hit.offset];

        self.scan_right(bases, pattern, &mut starts);

        if starts.len() < p.min_seed_count {
            return None;
        }

        let seed_count = starts.len();
        let (left, right) = self.agreed_extent(bases, &starts);
        let rep_len = left + right;
        if rep_len < p.min_repeat_len || rep_len > p.max_repeat_len {
            debug!("candidate repeat length {} out of bounds", rep_len);
            return None;
        }

        let mut positions = RepeatArray::new();
        for &s in &starts {
            positions.push(s - left, s - left + rep_len);
        }

        let repeat = {
            let (s, e) = positions.first().unwrap();
            &bases[s..e]
        };
        let spacers: Vec<&str> = positions
            .spacer_ranges()
            .iter()
            .map(|&(s, e)| &bases[s..e])
            .collect();
        if !self.qc(repeat, &spacers) {
            return None;
        }

        self.rescue_flanks(bases, &mut positions);

        Some(Candidate {
            positions,
            seed_count,
        })
    }

    /// Keep appending occurrences at the spacing set by the last two,
    /// within a tolerance window, until extension fails
    fn scan_right(&self, bases: &str, pattern: &str, starts: &mut Vec<usize>) {
        let p = &self.params;
        let len = bases.len();
        let w = p.window_len;

        loop {
            let n = starts.len();
            let last = starts[n - 1];
            let d = last - starts[n - 2];
            let projected = last + d;

            // the next occurrence cannot start before a minimal
            // repeat-spacer unit has passed
            let lo = (last + p.min_repeat_len + p.min_spacer_len)
                .max(projected.saturating_sub(p.scan_range / 2));
            let hi = (projected + p.scan_range / 2 + w).min(len);
            if lo + w > hi {
                return;
            }

            match self.matcher.find(&bases[lo..hi], pattern) {
                Some(hit) => starts.push(lo + hit.offset),
                None => return,
            }
        }
    }

    /// Closed-form repeat extent: the seed only pins `w` columns, so
    /// widen while every occurrence agrees and stays inside the read.
    /// Returns (columns gained leftward, total columns rightward).
    fn agreed_extent(&self, bases: &str, starts: &[usize]) -> (usize, usize) {
        let bytes = bases.as_bytes();
        let len = bytes.len();

        let mut right = self.params.window_len;
        'right: loop {
            if starts.iter().any(|&s| s + right >= len) {
                break;
            }
            let column = bytes[starts[0] + right];
            for &s in &starts[1..] {
                if bytes[s + right] != column {
                    break 'right;
                }
            }
            right += 1;
        }

        let mut left = 0;
        'left: loop {
            let need = left + 1;
            if starts.iter().any(|&s| s < need) {
                break;
            }
            let column = bytes[starts[0] - need];
            for &s in &starts[1..] {
                if bytes[s - need] != column {
                    break 'left;
                }
            }
            left += 1;
        }

        (left, right)
    }

    /// A truncated occurrence may hang off either read edge. Project
    /// one more occurrence from the nearest observed gap and keep it
    /// when the visible bases match the repeat exactly.
    fn rescue_flanks(&self, bases: &str, positions: &mut RepeatArray) {
        let w = self.params.window_len;
        if positions.len() < 2 {
            return;
        }
        let len = bases.len();
        let rep_len = positions.repeat_len();
        let gaps = positions.spacer_ranges();

        let (first_start, _) = positions.first().unwrap();
        let repeat = bases[first_start..first_start + rep_len].to_string();

        let first_gap = gaps.first().map(|&(s, e)| e - s).unwrap();
        if first_start >= first_gap + 1 {
            let prev_end = first_start - first_gap;
            if prev_end >= rep_len {
                let prev_start = prev_end - rep_len;
                if bases[prev_start..prev_end] == repeat {
                    positions.push_front(prev_start, prev_end);
                }
            } else if prev_end >= w && bases[..prev_end] == repeat[rep_len - prev_end..] {
                positions.push_front(0, prev_end);
            }
        }

        let (_, last_end) = positions.last().unwrap();
        let last_gap = gaps.last().map(|&(s, e)| e - s).unwrap();
        let next_start = last_end + last_gap;
        if next_start + rep_len <= len {
            if bases[next_start..next_start + rep_len] == repeat {
                positions.push(next_start, next_start + rep_len);
            }
        } else if next_start + w <= len && bases[next_start..] == repeat[..len - next_start] {
            positions.push(next_start, len);
        }
    }

    /// The four QC gates, applied in order
    fn qc(&self, repeat: &str, spacers: &[&str]) -> bool {
        let p = &self.params;

        let spacer_lens: Vec<usize> = spacers.iter().map(|s| s.len()).collect();
        if spacer_lens
            .iter()
            .any(|&l| l < p.min_spacer_len || l > p.max_spacer_len)
        {
            debug!("spacer length out of bounds for repeat {}", repeat);
            return false;
        }
        let lo = spacer_lens.iter().min().copied().unwrap_or(0);
        let hi = spacer_lens.iter().max().copied().unwrap_or(0);
        if hi - lo > SPACER_LENGTH_DIFF {
            debug!("spacer lengths too uneven for repeat {}", repeat);
            return false;
        }

        if is_low_complexity(repeat) {
            debug!("repeat {} is low complexity", repeat);
            return false;
        }

        if spacers.iter().any(|s| repeat_spacer_similar(repeat, s)) {
            debug!("repeat {} too similar to a spacer", repeat);
            return false;
        }

        if has_abundant_kmers(repeat, p.kmer_size) {
            debug!("repeat {} has overabundant {}-mers", repeat, p.kmer_size);
            return false;
        }

        true
    }
}

/// More than LOW_COMPLEXITY_THRESHOLD of the bases are one letter
pub fn is_low_complexity(repeat: &str) -> bool {
    if repeat.is_empty() {
        return true;
    }
    let counts = base_counts(repeat);
    let max = counts.iter().max().copied().unwrap_or(0);
    max as f64 / repeat.len() as f64 > LOW_COMPLEXITY_THRESHOLD
}

/// Edit-distance similarity above REPEAT_SPACER_MAX_SIMILARITY marks a
/// collapsed tandem repeat masquerading as repeat-plus-spacer
pub fn repeat_spacer_similar(repeat: &str, spacer: &str) -> bool {
    let max_len = repeat.len().max(spacer.len());
    if max_len == 0 {
        return true;
    }
    let dist = levenshtein(repeat, spacer);
    1.0 - dist as f64 / max_len as f64 > REPEAT_SPACER_MAX_SIMILARITY
}

/// Any k-mer claiming more than KMER_MAX_ABUNDANCE of the repeat's
/// k-mer windows marks a microsatellite-like repeat
pub fn has_abundant_kmers(repeat: &str, k: usize) -> bool {
    let bytes = repeat.as_bytes();
    if k == 0 || bytes.len() < k {
        return false;
    }
    let windows = bytes.len() - k + 1;

    let mut counts: HashMap<&[u8], usize> = HashMap::new();
    let mut max = 0;
    for kmer in bytes.windows(k) {
        let c = counts.entry(kmer).or_insert(0);
        *c += 1;
        max = max.max(*c);
    }
    max as f64 / windows as f64 > KMER_MAX_ABUNDANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_params() -> SearchParams {
        SearchParams {
            min_repeat_len: 4,
            max_repeat_len: 4,
            min_spacer_len: 4,
            max_spacer_len: 5,
            window_len: 3,
            scan_range: 30,
            min_seed_count: 3,
            max_mismatches: 0,
            kmer_size: 7,
        }
    }

    #[test]
    fn test_clean_three_repeat_read() {
        let finder = SingleReadFinder::new(toy_params());
        let read = RawRead::new("r1", "AAACGTGGGGACGTTTTTACGTCC");

        let record = finder.find(&read).unwrap();
        assert_eq!(
            record.positions.intervals(),
            &[(2, 6), (10, 14), (18, 22)]
        );
        assert_eq!(record.repeat_str(0), "ACGT");
        assert_eq!(record.spacer_strs(), vec!["GGGG", "TTTT"]);
    }

    #[test]
    fn test_too_few_seeds_rejected() {
        let finder = SingleReadFinder::new(toy_params());
        // only two occurrences of ACGT
        let read = RawRead::new("r1", "AAACGTGGGGACGTCCCCCCCCCC");
        assert!(finder.find(&read).is_none());
    }

    #[test]
    fn test_low_complexity_rejected() {
        let params = SearchParams {
            min_repeat_len: 5,
            max_repeat_len: 5,
            min_spacer_len: 4,
            max_spacer_len: 6,
            window_len: 3,
            min_seed_count: 3,
            ..SearchParams::default()
        };
        let finder = SingleReadFinder::new(params);
        // AAAAA three times with unique spacers
        let read = RawRead::new("r1", "AAAAACGTGAAAAATGCTAAAAA");
        assert!(finder.find(&read).is_none());
    }

    #[test]
    fn test_repeat_equal_to_spacer_rejected() {
        let params = SearchParams {
            min_repeat_len: 8,
            max_repeat_len: 8,
            min_spacer_len: 8,
            max_spacer_len: 8,
            window_len: 3,
            min_seed_count: 3,
            ..SearchParams::default()
        };
        let finder = SingleReadFinder::new(params);
        // a pure ACGTACGT tandem: "spacers" equal the repeat
        let read = RawRead::new("r1", &"ACGTACGT".repeat(5));
        assert!(finder.find(&read).is_none());
    }

    #[test]
    fn test_intervals_respect_bounds() {
        let finder = SingleReadFinder::new(toy_params());
        let read = RawRead::new("r1", "AAACGTGGGGACGTTTTTACGTCC");
        let record = finder.find(&read).unwrap();

        let p = finder.params();
        for &(s, e) in record.positions.intervals() {
            assert!(e - s >= p.min_repeat_len && e - s <= p.max_repeat_len);
        }
        for (s, e) in record.positions.spacer_ranges() {
            let l = e - s;
            assert!(l >= p.min_spacer_len && l <= p.max_spacer_len);
        }
    }

    #[test]
    fn test_seed_placement_with_mismatch() {
        let mut params = toy_params();
        params.max_mismatches = 1;
        let finder = SingleReadFinder::new(params);
        // middle occurrence AGGT differs from ACGT in one column; the
        // agreed extent shrinks to the columns all three share
        let read = RawRead::new("r1", "AAACGTGGGGAGGTTTTTACGTCC");
        let record = finder.find(&read).unwrap();
        assert_eq!(record.positions.len(), 3);
    }

    #[test]
    fn test_flank_rescue_truncated_edge() {
        let finder = SingleReadFinder::new(toy_params());
        // CGT | GGGG | ACGT | TTTT | ACGT | CCCC | ACGT | AA: a repeat
        // suffix hangs off the left edge one gap before the first full
        // occurrence
        let read = RawRead::new("r1", "CGTGGGGACGTTTTTACGTCCCCACGTAA");
        let record = finder.find(&read).unwrap();

        let first = record.positions.first().unwrap();
        assert_eq!(first, (0, 3));
        assert_eq!(&record.read.bases[first.0..first.1], "CGT");
        assert_eq!(record.positions.len(), 4);
    }

    #[test]
    fn test_qc_gate_low_complexity() {
        assert!(is_low_complexity("AAAAAAAA"));
        assert!(is_low_complexity("AAAAAAGA"));
        assert!(!is_low_complexity("ACGTACGT"));
        assert!(!is_low_complexity("AAAACGTA"));
    }

    #[test]
    fn test_qc_gate_similarity() {
        assert!(repeat_spacer_similar("ACGTACGT", "ACGTACGT"));
        assert!(repeat_spacer_similar("ACGTACGTACGT", "ACGTACGTACGA"));
        assert!(!repeat_spacer_similar("ACGTACGT", "GGGGCCCC"));
    }

    #[test]
    fn test_qc_gate_abundant_kmers() {
        // a dinucleotide microsatellite has only two distinct 7-mers
        let repeat = "AC".repeat(12);
        assert!(has_abundant_kmers(&repeat, 7));
        // too short for any window
        assert!(!has_abundant_kmers("ACGT", 7));
        // a diverse repeat keeps every 7-mer unique
        assert!(!has_abundant_kmers("GTTTCAGACCCACGTAGGTAGCT", 7));
    }

    #[test]
    fn test_params_validation() {
        assert!(SearchParams::default().validate().is_ok());

        let bad = SearchParams {
            min_repeat_len: 50,
            ..SearchParams::default()
        };
        assert!(bad.validate().is_err());

        let bad = SearchParams {
            window_len: 14,
            ..SearchParams::default()
        };
        assert!(bad.validate().is_err());

        let bad = SearchParams {
            min_spacer_len: 60,
            ..SearchParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
