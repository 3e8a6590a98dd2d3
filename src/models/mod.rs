pub mod account;
pub mod appointment;
pub mod enums;
pub mod prescription;
pub mod schedule;

pub use account::*;
pub use appointment::*;
pub use enums::*;
pub use prescription::*;
pub use schedule::*;
