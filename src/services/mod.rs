// Services that drive the core engines against the outside world

pub mod request_service;

pub use request_service::{HttpRequestService, RequestHandler};
