use serde::{Deserialize, Serialize};
use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Anything an image can be loaded from.
///
/// Models stay on the presentation thread; loaders turn them into `Send` byte
/// sources. `is_valid` rejects values that cannot name a resource at all.
pub trait Model: Clone + PartialEq + fmt::Debug + 'static {
    fn is_valid(&self) -> bool {
        true
    }
}

impl Model for PathBuf {
    fn is_valid(&self) -> bool {
        !self.as_os_str().is_empty()
    }
}

impl Model for String {
    fn is_valid(&self) -> bool {
        !self.trim().is_empty()
    }
}

/// Runtime identity of a Rust type, comparable and hashable.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identifier of a bundled resource (placeholder drawable, error drawable, animation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
