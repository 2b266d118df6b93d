//! # bestiary-store
//!
//! Relational persistence for the bestiary design data, backed by SQLite.
//!
//! Four resources and three join tables:
//! - `game_classes` ⟷ `attributes` via `class_attributes`
//! - `entities` ⟷ `attributes` via `entity_attributes`
//! - `specificities` ⟷ (entity, attribute) pairs via `attribute_connections`
//!
//! Cascade rules are deliberate and narrow: deleting a class *unlinks* its
//! children (their `parent_id` is cleared, they are never deleted); deleting
//! an entity or attribute removes the join rows that reference it.
//!
//! ## Quick start
//!
//! ```no_run
//! use bestiary_store::{DesignStore, NewEntity};
//!
//! let mut store = DesignStore::open_memory().unwrap();
//! let entity = store.create_entity(NewEntity {
//!     name: "Chauve-Terreur".into(),
//!     description: Some("Une créature nocturne dangereuse".into()),
//!     position: None,
//!     attribute_ids: vec![],
//! }).unwrap();
//! assert!(store.get_entity(entity.id).is_ok());
//! ```

pub mod attributes;
pub mod classes;
pub mod entities;
pub mod error;
pub mod schema;
pub mod specificities;
pub mod store;

pub use attributes::AttributePatch;
pub use classes::{ClassPatch, NewClass};
pub use entities::{EntityPatch, NewEntity};
pub use error::StoreError;
pub use specificities::{NewSpecificity, SpecificityFilter, SpecificityPatch};
pub use store::{DesignStore, StoreCounts};
