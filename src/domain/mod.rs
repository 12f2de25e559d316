pub mod auth;
pub mod dates;
pub mod line_item;
pub mod medication;
pub mod order;
pub mod prescription;
pub mod supplier;
pub mod transaction;
pub mod user;
