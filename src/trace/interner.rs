//! Compact integer ids for repeated identity values.
//!
//! Stream names and packet payload handles recur on nearly every event, so
//! the trace refers to them by small ids instead. Id 0 is reserved: it is
//! what an absent key maps to, and it is pre-registered as the empty name /
//! null handle so "unspecified" never collides with a real value.

use super::event::{PacketDataId, StreamName};
use std::collections::HashMap;
use std::sync::Arc;

/// Ids for stream names.
///
/// Lookup is fast when the same `Arc<str>` allocation is passed repeatedly:
/// the allocation address is checked first, the string value second. The
/// handle cache keeps a clone of every `Arc` it has seen, so an address in
/// the cache always belongs to a live allocation and cannot be reused by a
/// different name.
#[derive(Debug)]
pub struct StringIdMap {
    /// Allocation address -> (kept-alive allocation, id)
    handle_ids: HashMap<usize, (StreamName, i32)>,
    /// Canonical name -> id
    value_ids: HashMap<StreamName, i32>,
    next_id: i32,
}

impl StringIdMap {
    pub fn new() -> Self {
        let mut map = Self {
            handle_ids: HashMap::new(),
            value_ids: HashMap::new(),
            next_id: 0,
        };
        map.register_empty();
        map
    }

    fn register_empty(&mut self) {
        self.value_ids.insert(Arc::from(""), 0);
        self.next_id = 1;
    }

    /// Returns the id for a stream name, assigning one on first sight.
    pub fn intern(&mut self, name: Option<&StreamName>) -> i32 {
        let Some(name) = name else {
            return 0;
        };

        let handle = Arc::as_ptr(name) as *const u8 as usize;
        if let Some((_, id)) = self.handle_ids.get(&handle) {
            return *id;
        }

        let id = self.intern_value(name);
        self.handle_ids.insert(handle, (Arc::clone(name), id));
        id
    }

    /// Value-keyed path, shared by every handle with equal content.
    fn intern_value(&mut self, name: &StreamName) -> i32 {
        if let Some(&id) = self.value_ids.get(name.as_ref()) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.value_ids.insert(Arc::clone(name), id);
        id
    }

    /// Id already assigned to a name, if any
    pub fn get(&self, name: &str) -> Option<i32> {
        self.value_ids.get(name).copied()
    }

    /// Number of distinct names, including the reserved empty name
    pub fn len(&self) -> usize {
        self.value_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value_ids.is_empty()
    }

    /// Names indexed by id. Id 0 is the empty name.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, &id) in &self.value_ids {
            let index = id as usize;
            if names.len() <= index {
                names.resize(index + 1, String::new());
            }
            names[index] = name.to_string();
        }
        names
    }

    /// Forget every name. Id 0 stays reserved.
    pub fn clear(&mut self) {
        self.handle_ids.clear();
        self.value_ids.clear();
        self.register_empty();
    }
}

impl Default for StringIdMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids for packet payload handles.
///
/// The handle itself is the identity, so there is no value fallback.
#[derive(Debug)]
pub struct AddressIdMap {
    ids: HashMap<u64, i32>,
    next_id: i32,
}

impl AddressIdMap {
    pub fn new() -> Self {
        let mut map = Self {
            ids: HashMap::new(),
            next_id: 0,
        };
        map.register_null();
        map
    }

    fn register_null(&mut self) {
        self.ids.insert(0, 0);
        self.next_id = 1;
    }

    /// Returns the id for a payload handle, assigning one on first sight.
    pub fn intern(&mut self, handle: Option<PacketDataId>) -> i32 {
        let Some(PacketDataId(address)) = handle else {
            return 0;
        };
        if let Some(&id) = self.ids.get(&address) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(address, id);
        id
    }

    /// Number of distinct handles, including the reserved null handle
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget every handle. Id 0 stays reserved.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.register_null();
    }
}

impl Default for AddressIdMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> StreamName {
        Arc::from(value)
    }

    #[test]
    fn test_absent_and_empty_names_are_zero() {
        let mut ids = StringIdMap::new();
        assert_eq!(ids.intern(None), 0);
        assert_eq!(ids.intern(Some(&name(""))), 0);
        assert_eq!(ids.get(""), Some(0));
    }

    #[test]
    fn test_same_handle_same_id() {
        let mut ids = StringIdMap::new();
        let video = name("input_video");
        let first = ids.intern(Some(&video));
        let second = ids.intern(Some(&video));
        assert_eq!(first, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_equal_names_through_different_handles() {
        let mut ids = StringIdMap::new();
        let a = name("detections");
        let b = name("detections");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(ids.intern(Some(&a)), ids.intern(Some(&b)));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_names_indexed_by_id() {
        let mut ids = StringIdMap::new();
        ids.intern(Some(&name("a")));
        ids.intern(Some(&name("b")));
        ids.intern(Some(&name("a")));
        assert_eq!(ids.names(), vec!["".to_string(), "a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_clear_keeps_reserved_id() {
        let mut ids = StringIdMap::new();
        ids.intern(Some(&name("a")));
        ids.clear();
        assert_eq!(ids.names(), vec!["".to_string()]);
        assert_eq!(ids.intern(Some(&name("b"))), 1);
    }

    #[test]
    fn test_address_ids() {
        let mut ids = AddressIdMap::new();
        assert_eq!(ids.intern(None), 0);
        assert_eq!(ids.intern(Some(PacketDataId(0))), 0);

        let first = ids.intern(Some(PacketDataId(0x7f00_1000)));
        let second = ids.intern(Some(PacketDataId(0x7f00_2000)));
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(ids.intern(Some(PacketDataId(0x7f00_1000))), 1);

        ids.clear();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.intern(Some(PacketDataId(0x7f00_2000))), 1);
    }
}
