pub mod reference;
pub mod user;
