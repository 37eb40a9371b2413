// Service layer: a single handle that bundles the workspace collaborators.

pub mod entities;

pub use entities::EntityService;
