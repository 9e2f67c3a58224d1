/// Failure notices emitted by the sampler.
///
/// A failed sample never interrupts sampling; these exist so failures are
/// observable. Cancellation during teardown is expected and is not reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The metrics source failed to deliver a snapshot.
    TransportFailed(String),
    /// Two snapshots could not be turned into a sample.
    ComputationFailed(String),
}
