/// Standard IUB/IUPAC Nucleic Acid Codes, reduced to the five-letter
/// alphabet this crate works in
/// Code =>  Nucleic Acid(s)
///  A   =>  Adenine
///  C   =>  Cytosine
///  G   =>  Guanine
///  T   =>  Thymine
///  N   =>  anything else, including all ambiguity codes

/// Maps an ASCII char to its uppercase ACGTN form
///
/// A = 65, a = 97  => A
/// C = 67, c = 99  => C
/// G = 71, g = 103 => G
/// T = 84, t = 116 => T
/// U = 85, u = 117 => T
/// everything else => N
pub static NT_UP: &[u8; 256] = &{
    let mut array = [b'N'; 256];

    array[b'A' as usize] = b'A';
    array[b'a' as usize] = b'A';

    array[b'C' as usize] = b'C';
    array[b'c' as usize] = b'C';

    array[b'G' as usize] = b'G';
    array[b'g' as usize] = b'G';

    array[b'T' as usize] = b'T';
    array[b't' as usize] = b'T';
    array[b'U' as usize] = b'T';
    array[b'u' as usize] = b'T';

    array
};

/// Watson-Crick complement over ACGTN
pub static NT_COMP: &[u8; 256] = &{
    let mut array = [b'N'; 256];

    array[b'A' as usize] = b'T';
    array[b'C' as usize] = b'G';
    array[b'G' as usize] = b'C';
    array[b'T' as usize] = b'A';

    array
};

/// Uppercases a sequence and coerces every non-ACGT base to `N`
///
/// ```
/// assert_eq!(criscan::to_acgtn("acgtrytu"), "ACGTNNTT");
/// ```
pub fn to_acgtn(seq: &str) -> String {
    seq.bytes()
        .map(|b| char::from(NT_UP[b as usize]))
        .collect()
}

/// Reverse complement of an ACGTN sequence
///
/// ```
/// assert_eq!(criscan::rev_comp("AAACGT"), "ACGTTT");
/// assert_eq!(criscan::rev_comp("ANT"), "ANT");
/// ```
pub fn rev_comp(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| char::from(NT_COMP[b as usize]))
        .collect()
}

/// Count of each of A, C, G, T in the sequence; N is not counted
pub fn base_counts(seq: &str) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for b in seq.bytes() {
        match b {
            b'A' => counts[0] += 1,
            b'C' => counts[1] += 1,
            b'G' => counts[2] += 1,
            b'T' => counts[3] += 1,
            _ => {}
        }
    }
    counts
}
