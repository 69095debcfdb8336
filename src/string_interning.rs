//! Centralized string interning, carried over near-verbatim from the
//! teacher's `compiler_frontend/string_interning.rs`: a dual `Vec<Box<str>>`
//! / `FxHashMap<&str, StringId>` table giving O(1) id<->string resolution.
//! Declaration names, package names, and MIR global names are all interned
//! here rather than passed around as owned `String`s.

use rustc_hash::FxHashMap;

const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn resolve(self, table: &StringTable) -> &str {
        table.resolve(self)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct StringTable {
    strings: Vec<Box<str>>,
    string_to_id: FxHashMap<&'static str, StringId>,
    next_id: u32,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }
        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.next_id);
        self.next_id += 1;

        let boxed: Box<str> = s.into();

        // SAFETY: the StringTable owns `boxed` for the rest of the program's
        // lifetime, never removes entries, and never reallocates the boxed
        // string's backing storage, so a 'static borrow of it is sound as
        // long as it never outlives the table. Same reasoning as the
        // teacher's `intern_new`.
        let static_ref: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(boxed.as_ref()) };

        self.string_to_id.insert(static_ref, new_id);
        self.strings.push(boxed);

        new_id
    }

    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_twice_returns_same_id() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
        assert_eq!(table.resolve(a), "foo");
        assert_eq!(table.resolve(b), "bar");
    }
}
