//! Entity implementation

use std::fmt;

/// Entity identifier
///
/// Id `0` is reserved for [`Entity::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Entity {
    id: u32,
}

impl Entity {
    /// The null entity; never allocated by a world
    pub const NULL: Self = Self { id: 0 };

    /// Create an entity with the given ID
    pub(crate) const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Wrap a raw id, for callers that store entity ids externally
    pub const fn from_raw(id: u32) -> Self {
        Self::new(id)
    }

    /// Whether this is the null entity
    pub const fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}
