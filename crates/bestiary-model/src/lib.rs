//! # bestiary-model
//!
//! Domain model for the bestiary content-design tool:
//! - [`model::GameClass`] — named, colored, optionally-hierarchical attribute grouping
//! - [`model::Attribute`] — a named trait owned by exactly one class
//! - [`model::Entity`]    — a designed object carrying attributes and a canvas position
//! - [`model::Specificity`] — free text annotating one or more (entity, attribute) pairs

pub mod model;

pub use model::{
    Attribute, AttributeConnection, Entity, GameClass, Position, Specificity,
};
