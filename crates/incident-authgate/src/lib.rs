mod middleware;
mod request_info;

pub use middleware::require_bearer_token;
pub use middleware::require_user_session;
pub use middleware::validate_user_session;
pub use request_info::capture as capture_request_info;
pub use request_info::RequestInfo;
