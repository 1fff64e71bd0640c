pub mod audit;
pub mod auth;
pub mod barangay_profile;
pub mod certificates;
pub mod history;
pub mod households;
pub mod incidents;
pub mod officials;
pub mod residents;
pub mod social_services;
pub mod uploads;
