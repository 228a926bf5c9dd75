/// Admin game creation with thumbnail hosting.
pub mod admin_service;
/// Game catalog reads and writes.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Base64 image relay to the image host.
pub mod image_relay;
/// Storage connection, health polling and reconnection.
pub mod storage_supervisor;
