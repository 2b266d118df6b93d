//! # bestiary-sdk
//!
//! Typed async client for the bestiary design API. One method per endpoint,
//! all responses unwrapped from the standard `{data, success}` envelope.
//!
//! [`DesignClient`] also implements the `bestiary-canvas` backend traits, so
//! a [`bestiary_canvas::CanvasController`] can be wired straight to a running
//! server.

mod backend;
mod client;

pub use client::{
    ClassPatchParams, ConnectionParams, DesignClient, EntityPatchParams, NewClassParams,
    NewEntityParams, NewSpecificityParams, SdkError, SpecificityFilterParams,
    SpecificityPatchParams, Stats,
};
