pub mod appointment;
pub mod emergency_contact;
pub mod enums;
pub mod hospital;
pub mod insurance;
pub mod orders;
pub mod profile;
pub mod timeline;

pub use appointment::*;
pub use emergency_contact::*;
pub use hospital::*;
pub use insurance::*;
pub use orders::*;
pub use profile::*;
pub use timeline::*;
