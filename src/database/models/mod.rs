pub mod appointment;
pub mod craftsman;
pub mod customer;
pub mod invoice;
pub mod material;
pub mod quote;

pub use appointment::{Appointment, AppointmentStatus};
pub use craftsman::Craftsman;
pub use customer::Customer;
pub use invoice::Invoice;
pub use material::Material;
pub use quote::Quote;
