//! An RPC boundary for methods built on `soia_core` serializers: register
//! `(name, number, request serializer, response serializer, handler)`
//! tuples on a [`Service`] and dispatch request bodies to them.
//!
//! # Example Usage
//! ```
//! use soia::{HandlerError, Service};
//!
//! let name_serializer = soia::demo::string_serializer();
//! let greeting_serializer = soia::demo::string_serializer();
//!
//! let service = Service::builder()
//!     .with_method("greet", 1, name_serializer, greeting_serializer, |name: String| async move {
//!         Ok(format!("hello, {}", name))
//!     })
//!     .unwrap()
//!     .build();
//!
//! let headers = std::collections::HashMap::new();
//! let response = tokio_test::block_on(service.handle_request("greet::readable:\"ada\"", &headers, Some(true)));
//! assert_eq!(response.status, 200);
//! ```

pub mod demo;
pub mod error;
pub mod service;

pub use error::{HandlerError, RegistryError};
pub use service::{RpcResponse, Service, ServiceBuilder};

/// Initializes the ambient logger once per process; safe to call more than
/// once (subsequent calls are no-ops).
pub fn init_logging(level: log::LevelFilter) {
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn unregistered_method_name_is_a_routing_error() {
        let service = Service::builder().build();
        let response = service.handle_request("nope::readable:null", &HashMap::new(), Some(true)).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn empty_body_lists_methods() {
        let name_serializer = demo::string_serializer();
        let service = Service::builder()
            .with_method("greet", 1, name_serializer, name_serializer, |name: String| async move { Ok(name) })
            .unwrap()
            .build();
        let response = service.handle_request("", &HashMap::new(), Some(true)).await;
        assert_eq!(response.status, 200);
        assert!(response.body.contains("greet"));
    }

    #[tokio::test]
    async fn unrecognized_policy_falls_back_to_service_config() {
        let name_serializer = demo::string_serializer();
        let service = Service::builder()
            .config(service::ServiceConfig::new().keep_unrecognized_values(false))
            .with_method("echo", 1, name_serializer, name_serializer, |name: String| async move { Ok(name) })
            .unwrap()
            .build();
        let response = service.handle_request("echo::readable:\"hi\"", &HashMap::new(), None).await;
        assert_eq!(response.status, 200);
    }
}
