//! Tracing and logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Log target for security-relevant anomalies (bad signatures, amount
/// mismatches, rejected admin tokens). Filter with `RUST_LOG=security=warn`.
pub const SECURITY_TARGET: &str = "security";

/// Tracing configuration (filters, layers).
pub mod tracing;
