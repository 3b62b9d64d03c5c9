//! The zone name table: a read-only `zone id -> display name` mapping built
//! once at startup from the game's static zone records.

use std::collections::HashMap;

use tracing::debug;

use crate::text::RichText;

/// One row of the static zone data sheet. The display name arrives in the
/// client's encoded string form.
#[derive(Debug, Clone)]
pub struct ZoneRecord {
    pub id: u32,
    pub name: Vec<u8>,
}

/// Read-only source of the static zone records, consumed once at startup.
pub trait ZoneDataSource: Send + Sync {
    fn zone_records(&self) -> Vec<ZoneRecord>;
}

/// Immutable after construction; concurrent reads need no locking. A default
/// (not yet built) table resolves nothing, which callers treat as the zone
/// being unknown rather than an error.
#[derive(Debug, Default)]
pub struct ZoneNameTable {
    names: HashMap<u32, String>,
}

impl ZoneNameTable {
    pub fn load(source: &dyn ZoneDataSource) -> Self {
        let mut names = HashMap::new();
        for record in source.zone_records() {
            let name = RichText::decode(&record.name).flatten();
            if name.is_empty() {
                continue;
            }
            names.insert(record.id, name);
        }
        debug!(zones = names.len(), "zone name table built");
        Self { names }
    }

    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
