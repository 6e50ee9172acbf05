pub mod dentists;
pub mod users;
