pub mod course;
pub mod profile;
