pub mod auth;
pub mod booking;
pub mod catalog;
pub mod dashboard;
pub mod notification;
