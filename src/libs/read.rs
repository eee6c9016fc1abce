use itertools::Itertools;

use crate::libs::nt::rev_comp;

//----------------------------
// RawRead
//----------------------------
/// A sequencing read, immutable once loaded. Bases are uppercase ACGTN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRead {
    pub name: String,
    pub bases: String,
}

impl RawRead {
    pub fn new(name: &str, bases: &str) -> Self {
        Self {
            name: name.to_string(),
            bases: bases.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

//----------------------------
// RepeatArray
//----------------------------
/// Ordered, non-overlapping half-open intervals marking repeat
/// occurrences within one read.
///
/// Interior intervals all share one length; the first and last may be
/// truncated at the read's edges.
///
/// ```
/// # use criscan::RepeatArray;
/// let mut arr = RepeatArray::new();
/// arr.push(2, 6);
/// arr.push(10, 14);
/// arr.push(18, 22);
/// assert_eq!(arr.repeat_len(), 4);
/// assert_eq!(arr.spacer_ranges(), vec![(6, 10), (14, 18)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatArray {
    intervals: Vec<(usize, usize)>,
}

impl RepeatArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interval; starts must strictly increase
    pub fn push(&mut self, start: usize, end: usize) {
        debug_assert!(start < end);
        if let Some(&(last_start, last_end)) = self.intervals.last() {
            debug_assert!(start > last_start && start >= last_end);
        }
        self.intervals.push((start, end));
    }

    /// Insert an interval before all existing ones
    pub fn push_front(&mut self, start: usize, end: usize) {
        debug_assert!(start < end);
        if let Some(&(first_start, _)) = self.intervals.first() {
            debug_assert!(end <= first_start);
        }
        self.intervals.insert(0, (start, end));
    }

    pub fn intervals(&self) -> &[(usize, usize)] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn first(&self) -> Option<(usize, usize)> {
        self.intervals.first().copied()
    }

    pub fn last(&self) -> Option<(usize, usize)> {
        self.intervals.last().copied()
    }

    /// Length of an untruncated occurrence, i.e. the longest interval
    pub fn repeat_len(&self) -> usize {
        self.intervals.iter().map(|&(s, e)| e - s).max().unwrap_or(0)
    }

    /// Bases covered by all intervals together
    pub fn covered_len(&self) -> usize {
        self.intervals.iter().map(|&(s, e)| e - s).sum()
    }

    /// The gaps between consecutive intervals
    pub fn spacer_ranges(&self) -> Vec<(usize, usize)> {
        self.intervals
            .iter()
            .tuple_windows()
            .map(|(&(_, e), &(s, _))| (e, s))
            .collect()
    }

    /// Mirror every interval through a read of length `read_len` and
    /// restore ascending order: `[s, e)` becomes `[L - e, L - s)`
    pub fn reverse(&mut self, read_len: usize) {
        for iv in self.intervals.iter_mut() {
            *iv = (read_len - iv.1, read_len - iv.0);
        }
        self.intervals.reverse();
    }
}

//----------------------------
// ReadRecord
//----------------------------
/// A read together with its repeat occurrences and the orientation
/// decision made during canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub read: RawRead,
    pub positions: RepeatArray,
    pub was_low_lex: bool,
}

impl ReadRecord {
    pub fn new(read: RawRead, positions: RepeatArray) -> Self {
        Self {
            read,
            positions,
            was_low_lex: true,
        }
    }

    /// The bases under interval `i`
    pub fn repeat_str(&self, i: usize) -> &str {
        let (s, e) = self.positions.intervals()[i];
        &self.read.bases[s..e]
    }

    /// The bases of every internal spacer, in order
    pub fn spacer_strs(&self) -> Vec<&str> {
        self.positions
            .spacer_ranges()
            .iter()
            .map(|&(s, e)| &self.read.bases[s..e])
            .collect()
    }

    /// An interval is partial when it is truncated at a read edge
    fn is_partial(&self, i: usize) -> bool {
        let (s, e) = self.positions.intervals()[i];
        s == 0 || e == self.read.len()
    }

    /// The interval whose bases define this read's repeat: the first
    /// full one, or the longest when every occurrence touches an edge,
    /// breaking length ties toward the smaller repeat string
    fn orienting_interval(&self) -> (usize, usize) {
        let n = self.positions.len();
        for i in 0..n {
            if !self.is_partial(i) {
                return self.positions.intervals()[i];
            }
        }
        self.positions
            .intervals()
            .iter()
            .copied()
            .max_by_key(|&(s, e)| (e - s, std::cmp::Reverse(&self.read.bases[s..e])))
            .expect("positions must be nonempty")
    }
}

//----------------------------
// canonicalize
//----------------------------
/// Orient a record so its repeat is in lowest lexicographic form.
///
/// Returns the canonical repeat string, which keys the record's group.
/// A palindromic repeat keeps the original orientation. When the read
/// must flip, its bases are reverse-complemented and every interval is
/// mirrored.
pub fn canonicalize(record: &mut ReadRecord) -> String {
    let (s, e) = record.orienting_interval();
    let repeat = record.read.bases[s..e].to_string();
    let flipped = rev_comp(&repeat);

    if repeat <= flipped {
        record.was_low_lex = true;
        repeat
    } else {
        let read_len = record.read.len();
        record.read.bases = rev_comp(&record.read.bases);
        record.positions.reverse(read_len);
        record.was_low_lex = false;
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_repeat_record() -> ReadRecord {
        // ACGT at 2, 10 and 18 with spacers GGGG and TTTT
        let read = RawRead::new("r1", "AAACGTGGGGACGTTTTTACGTCC");
        let mut arr = RepeatArray::new();
        arr.push(2, 6);
        arr.push(10, 14);
        arr.push(18, 22);
        ReadRecord::new(read, arr)
    }

    #[test]
    fn test_spacer_extraction() {
        let record = three_repeat_record();
        assert_eq!(record.spacer_strs(), vec!["GGGG", "TTTT"]);
        assert_eq!(record.repeat_str(0), "ACGT");
        assert_eq!(record.repeat_str(2), "ACGT");
    }

    #[test]
    fn test_reverse_maps_intervals() {
        let mut arr = RepeatArray::new();
        arr.push(2, 6);
        arr.push(10, 14);
        arr.reverse(20);
        assert_eq!(arr.intervals(), &[(6, 10), (14, 18)]);
    }

    #[test]
    fn test_canonicalize_keeps_low_lex() {
        let mut record = three_repeat_record();
        // ACGT is its own reverse complement, a palindrome tie
        let canonical = canonicalize(&mut record);
        assert_eq!(canonical, "ACGT");
        assert!(record.was_low_lex);
        assert_eq!(record.read.bases, "AAACGTGGGGACGTTTTTACGTCC");
    }

    #[test]
    fn test_canonicalize_flips_high_lex() {
        // repeat TTAC, reverse complement GTAA < TTAC
        let read = RawRead::new("r2", "GTTACCCCCCCTTACCCCCCCCCG");
        let mut arr = RepeatArray::new();
        arr.push(1, 5);
        arr.push(11, 15);
        let mut record = ReadRecord::new(read, arr);

        let canonical = canonicalize(&mut record);
        assert_eq!(canonical, "GTAA");
        assert!(!record.was_low_lex);
        assert_eq!(record.read.bases.len(), 24);
        // [1,5) maps to [19,23)
        assert_eq!(record.positions.intervals(), &[(9, 13), (19, 23)]);
        assert_eq!(&record.read.bases[19..23], "GTAA");
    }

    #[test]
    fn test_canonicalize_is_idempotent_under_orientation() {
        // canonicalizing a read and canonicalizing its reverse
        // complement must meet at the same record
        let mut forward = three_repeat_record();

        let mut flipped = forward.clone();
        let read_len = flipped.read.len();
        flipped.read.bases = rev_comp(&flipped.read.bases);
        flipped.positions.reverse(read_len);

        let key_fwd = canonicalize(&mut forward);
        let key_rev = canonicalize(&mut flipped);

        assert_eq!(key_fwd, key_rev);
        assert_eq!(forward.read.bases, flipped.read.bases);
        assert_eq!(forward.positions, flipped.positions);
    }

    #[test]
    fn test_partial_first_interval_is_skipped() {
        // the first interval is truncated at the left edge; the second,
        // full occurrence must orient the read
        let read = RawRead::new("r3", "GTCCCCCCTTACCCCCC");
        let mut arr = RepeatArray::new();
        arr.push(0, 2); // truncated TTAC
        arr.push(8, 12);
        let mut record = ReadRecord::new(read, arr);

        let canonical = canonicalize(&mut record);
        assert_eq!(canonical, "GTAA");
        assert!(!record.was_low_lex);
    }

    #[test]
    fn test_single_edge_interval_uses_smaller_string() {
        // one interval flush against the left edge: partial, so the
        // orientation tie-break compares the two candidate strings
        let read = RawRead::new("r4", "TTACGGGGGG");
        let mut arr = RepeatArray::new();
        arr.push(0, 4);
        let mut record = ReadRecord::new(read, arr);

        let canonical = canonicalize(&mut record);
        assert_eq!(canonical, "GTAA");
        assert!(!record.was_low_lex);
        assert_eq!(record.positions.intervals(), &[(6, 10)]);
    }
}
