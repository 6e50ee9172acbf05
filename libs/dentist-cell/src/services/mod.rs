pub mod patients;
pub mod profile;
pub mod working_hours;
