pub mod probe_gate;

pub use probe_gate::{ProbeGate, ProbeGateConfig};
