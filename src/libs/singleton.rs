use log::debug;

use crate::libs::nt::rev_comp;
use crate::libs::read::{canonicalize, RawRead, ReadRecord, RepeatArray};
use crate::libs::wumanber::WuManber;

//----------------------------
// SingletonFinder
//----------------------------
/// Pass 2: reads too short to hold two repeat copies still carry
/// evidence when they contain one copy of a repeat discovered
/// elsewhere. The pattern set is every canonical repeat in both
/// orientations, so a read arriving reverse-complemented is caught and
/// folded into the right group by canonicalization.
pub struct SingletonFinder {
    wm: WuManber,
}

impl SingletonFinder {
    /// Build the multi-pattern set; `None` when pass 1 found nothing
    pub fn new(canonical_repeats: &[String]) -> Option<Self> {
        if canonical_repeats.is_empty() {
            return None;
        }

        let mut patterns: Vec<String> = Vec::new();
        for repeat in canonical_repeats {
            patterns.push(repeat.clone());
            let flipped = rev_comp(repeat);
            if flipped != *repeat {
                patterns.push(flipped);
            }
        }
        debug!("singleton pass over {} patterns", patterns.len());

        Some(Self {
            wm: WuManber::new(&patterns),
        })
    }

    /// First occurrence of any known repeat in `read` yields a
    /// one-interval record plus the key of the group it belongs to.
    /// Additional occurrences are not sought: pass 1 already owns
    /// every read with two or more copies.
    pub fn find(&self, read: &RawRead) -> Option<(String, ReadRecord)> {
        let (idx, offset) = self.wm.search_first(&read.bases)?;
        let pattern_len = self.wm.pattern(idx).len();

        let mut positions = RepeatArray::new();
        positions.push(offset, offset + pattern_len);

        let mut record = ReadRecord::new(read.clone(), positions);
        let key = canonicalize(&mut record);
        Some((key, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::finder::{SearchParams, SingleReadFinder};

    #[test]
    fn test_singleton_read_is_rescued() {
        let params = SearchParams {
            min_repeat_len: 4,
            max_repeat_len: 4,
            min_spacer_len: 4,
            max_spacer_len: 5,
            window_len: 3,
            min_seed_count: 3,
            ..SearchParams::default()
        };
        let finder = SingleReadFinder::new(params);

        // one copy of GATC: pass 1 cannot seed a second occurrence
        let short = RawRead::new("s1", "TTTTTGATCTTTTT");
        assert!(finder.find(&short).is_none());

        let singleton = SingletonFinder::new(&["GATC".to_string()]).unwrap();
        let (key, record) = singleton.find(&short).unwrap();
        assert_eq!(key, "GATC");
        assert_eq!(record.positions.intervals(), &[(5, 9)]);
        assert_eq!(record.repeat_str(0), "GATC");
    }

    #[test]
    fn test_singleton_flipped_read_joins_same_group() {
        // the read carries the reverse complement of the known repeat
        let read = RawRead::new("s2", "CCCCCTGCAGGCCCCC");
        // rev_comp(GCCTGCA) = TGCAGGC
        let singleton = SingletonFinder::new(&["GCCTGCA".to_string()]).unwrap();

        let (key, record) = singleton.find(&read).unwrap();
        assert_eq!(key, "GCCTGCA");
        assert!(!record.was_low_lex);
        let (s, e) = record.positions.first().unwrap();
        assert_eq!(&record.read.bases[s..e], "GCCTGCA");
    }

    #[test]
    fn test_no_patterns_no_finder() {
        assert!(SingletonFinder::new(&[]).is_none());
    }

    #[test]
    fn test_read_without_any_pattern() {
        let singleton = SingletonFinder::new(&["GATCGATC".to_string()]).unwrap();
        let read = RawRead::new("s3", "AAAAAAAAAAAAAAAA");
        assert!(singleton.find(&read).is_none());
    }
}
