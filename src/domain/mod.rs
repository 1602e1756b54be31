// Market data delivered by the exchange
pub mod market;

// Signal objects produced by the engine
pub mod signals;

// Collaborator interfaces
pub mod ports;

// Request context
pub mod context;

// Domain-specific error types
pub mod errors;
