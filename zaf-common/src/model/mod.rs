// src/model/mod.rs
pub mod component;

// Re-export
pub use component::ComponentDescriptor;
