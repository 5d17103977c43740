pub mod advisor_http;

pub use advisor_http::HttpAdvisoryAdapter;
