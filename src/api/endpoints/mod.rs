//! HTTP handlers, one module per resource.

pub mod appointments;
pub mod emergency_contacts;
pub mod health;
pub mod hospitals;
pub mod insurance;
pub mod orders;
pub mod profiles;
pub mod recommendations;
pub mod settings;
pub mod timeline;
