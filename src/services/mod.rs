pub mod api_client;
pub mod normalizer;
pub mod preview_service;
pub mod report_service;
pub mod session;
