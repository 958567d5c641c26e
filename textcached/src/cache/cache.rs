use super::error::Result;
use bytes::Bytes;

/// Cache key type
pub type KeyType = Bytes;

/// Cache value associated with a key
pub type ValueType = Bytes;

/// Entry expiration state, resolved at write time against the server clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// exptime 0: the entry never expires
    Never,
    /// positive exptime: invisible once the server clock passes this second
    At(u32),
    /// negative exptime: expired before it was ever readable
    Expired,
}

impl Expiry {
    /// Resolves a raw protocol exptime against the current timestamp.
    ///
    /// A positive exptime is relative seconds from now, 0 means never,
    /// anything negative is already expired.
    pub fn resolve(exptime: i64, now: u32) -> Expiry {
        match exptime {
            0 => Expiry::Never,
            e if e > 0 => Expiry::At(now.saturating_add(u32::try_from(e).unwrap_or(u32::MAX))),
            _ => Expiry::Expired,
        }
    }

    pub fn is_past(&self, now: u32) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(deadline) => now > *deadline,
            Expiry::Expired => true,
        }
    }
}

/// Meta data stored with cache value
#[derive(Clone, Copy, Debug)]
pub struct EntryMeta {
    pub(crate) flags: u32,
    pub(crate) byte_count: u32,
    pub(crate) expire_at: Expiry,
}

impl EntryMeta {
    pub fn new(flags: u32, byte_count: u32, expire_at: Expiry) -> EntryMeta {
        EntryMeta {
            flags,
            byte_count,
            expire_at,
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Declared payload length as supplied by the client at write time.
    /// Reported verbatim by `get`; never recomputed from the payload.
    pub fn byte_count(&self) -> u32 {
        self.byte_count
    }

    pub fn expire_at(&self) -> Expiry {
        self.expire_at
    }
}

/// Value and meta data stored in cache
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) header: EntryMeta,
    pub(crate) value: ValueType,
}

impl Record {
    pub fn new(value: ValueType, flags: u32, byte_count: u32, expire_at: Expiry) -> Record {
        let header = EntryMeta::new(flags, byte_count, expire_at);
        Record { header, value }
    }

    pub fn header(&self) -> &EntryMeta {
        &self.header
    }

    pub fn value(&self) -> &ValueType {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// An abstraction over a generic key <=> entry store.
///
/// Implementations own their synchronization: every operation is atomic
/// from an external observer's perspective.
pub trait Cache {
    /// Returns a value associated with a key. An entry past its expiration
    /// is evicted as a side effect and reported as NotFound.
    fn get(&self, key: &KeyType) -> Result<Record>;

    /// Unconditional create-or-replace. The capacity policy is enforced
    /// before a new key is inserted.
    fn set(&self, key: KeyType, record: Record) -> Result<()>;

    /// Stores the entry only if the key is absent, otherwise fails with
    /// KeyExists. A lazily expired entry counts as absent.
    fn add(&self, key: KeyType, record: Record) -> Result<()>;

    /// Replaces the entry only if the key is present, otherwise fails with
    /// NotFound.
    fn replace(&self, key: KeyType, record: Record) -> Result<()>;

    /// Appends the given bytes to an existing entry's payload. The entry's
    /// flags, byte_count and expiration are left untouched.
    fn append(&self, key: KeyType, tail: ValueType) -> Result<()>;

    /// Prepends the given bytes to an existing entry's payload, preserving
    /// the entry meta data like `append`.
    fn prepend(&self, key: KeyType, head: ValueType) -> Result<()>;

    /// Removes an entry, returning it. NotFound when the key is absent or
    /// only a lazily expired entry remains.
    fn delete(&self, key: &KeyType) -> Result<Record>;

    /// Moves the capacity ceiling by delta entries, saturating at zero.
    /// Never evicts by itself. Returns the new ceiling.
    fn adjust_capacity(&self, delta: i64) -> usize;

    /// Number of entries currently in the mapping, expired ones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
