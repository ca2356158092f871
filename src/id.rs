//! Code for handling IDs
use crate::simulation::SimulationError;
use anyhow::Result;
use indexmap::IndexMap;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        /// An ID type (e.g. `ProjectID`, `TariffID`, etc.)
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::sync::Arc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

/// Indicates that the struct has an ID field
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Implement the `HasID` trait for the given type, assuming it has a field called `id`
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// A map of records keyed by their ID which can be queried by string
pub trait IDCollection<ID: IDLike, T> {
    /// Look up a record by the string representation of its ID.
    ///
    /// # Arguments
    ///
    /// * `kind` - What sort of record is being looked up (used in the error message)
    /// * `id` - The string representation of the ID
    ///
    /// # Returns
    ///
    /// The record, or a [`SimulationError::MissingReferenceData`] error if it is not found.
    fn get_by_str(&self, kind: &str, id: &str) -> Result<&T>;
}

impl<ID: IDLike, T> IDCollection<ID, T> for IndexMap<ID, T> {
    fn get_by_str(&self, kind: &str, id: &str) -> Result<&T> {
        self.get(id)
            .ok_or_else(|| SimulationError::MissingReferenceData(format!("Unknown {kind} ID {id}")))
            .map_err(Into::into)
    }
}
