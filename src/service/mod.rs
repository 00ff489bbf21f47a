pub mod mapper_service;
pub mod session;
