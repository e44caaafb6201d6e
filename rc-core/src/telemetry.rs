//! Telemetry back-channel error type.

/// Error type for raw telemetry writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Receiver has no byte source (not started, or ended).
    NotStarted,
    /// Nothing to send.
    EmptyPayload,
    /// Transport accepted only this many bytes.
    Incomplete(usize),
}
