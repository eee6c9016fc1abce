use indexmap::IndexSet;

/// Dense integer handle for an interned string. 0 means "absent".
pub type StringToken = u32;

//----------------------------
// StringPool
//----------------------------
/// Append-only bidirectional mapping between strings and dense tokens.
///
/// Tokens start at 1 so that 0 can be used as a sentinel, the same
/// convention the rest of the crate relies on when walking repeat and
/// spacer observations.
///
/// ```
/// # use criscan::StringPool;
/// let mut pool = StringPool::new();
/// let t1 = pool.intern("GTTTCAGA");
/// let t2 = pool.intern("ACCA");
/// assert_eq!(t1, 1);
/// assert_eq!(t2, 2);
/// assert_eq!(pool.intern("GTTTCAGA"), t1);
/// assert_eq!(pool.get("ACCA"), Some(t2));
/// assert_eq!(pool.resolve(t2), Some("ACCA"));
/// assert_eq!(pool.get("TTTT"), None);
/// ```
#[derive(Default, Debug, Clone)]
pub struct StringPool {
    strings: IndexSet<String>,
}

impl StringPool {
    pub fn new() -> Self {
        Self {
            strings: IndexSet::new(),
        }
    }

    /// Token for `s`, interning it on first sight
    pub fn intern(&mut self, s: &str) -> StringToken {
        if let Some(idx) = self.strings.get_index_of(s) {
            return (idx + 1) as StringToken;
        }
        let (idx, _) = self.strings.insert_full(s.to_string());
        (idx + 1) as StringToken
    }

    /// Token for `s` if already interned
    pub fn get(&self, s: &str) -> Option<StringToken> {
        self.strings
            .get_index_of(s)
            .map(|idx| (idx + 1) as StringToken)
    }

    /// The string behind a token
    pub fn resolve(&self, token: StringToken) -> Option<&str> {
        if token == 0 {
            return None;
        }
        self.strings
            .get_index(token as usize - 1)
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
