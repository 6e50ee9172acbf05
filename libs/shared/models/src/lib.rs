pub mod appointment;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod dentist;
pub mod error;
pub mod notification;
pub mod pagination;
pub mod patient;
pub mod user;
