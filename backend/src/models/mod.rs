pub mod auth;
pub mod barangay_profile;
pub mod certificate;
pub mod de;
pub mod history_log;
pub mod household;
pub mod incident;
pub mod official;
pub mod resident;
pub mod service;
pub mod upload;
pub mod user;
