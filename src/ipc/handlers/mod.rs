pub mod agenda;
pub mod areas;
pub mod attendance;
pub mod auth;
pub mod backup;
pub mod classes;
pub mod core;
pub mod evaluations;
pub mod notices;
pub mod schedule;
pub mod students;
pub mod users;
