/// API response type definitions
///
/// Standard response structures for REST API endpoints
use chrono::{ DateTime, Utc };
use serde::Serialize;

/// Uniform error body for failed requests
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Simple health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Runtime counters for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub ws_connections: usize,
    pub version: String,
}
