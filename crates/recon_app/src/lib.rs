//! Recon dashboard application: a terminal front end that keeps one scan
//! module's HTML page in sync with the backend job list.
pub mod platform;
