//! Fusion Engine Adapter
//!
//! The air-quality fusion library is a closed black box: it decides when the
//! sensor must measure and how, turns physical signals into derived outputs
//! (IAQ, CO2 equivalent, ...), and keeps calibration history in an opaque
//! state blob. This trait is the capability surface a binding exposes.
//!
//! ## Call Sequence
//!
//! ```text
//! init ─→ subscribe ─→ import_state ─┐
//!                                   ▼
//!        ┌──────── plan_next(now) ◄──────────┐
//!        │ trigger?                           │
//!        ▼                                    │
//!   configure + measure ─→ process(batch) ────┘
//!                              │
//!              (every few hours) export_state
//! ```
//!
//! ## Implementation Notes
//!
//! - All calls are synchronous and may fail with a library status code,
//!   returned verbatim in [`EngineError`]
//! - The library is stateful and not reentrant; `&mut self` everywhere keeps
//!   it owned by exactly one task
//! - State blobs are treated as bytes only; nothing outside the binding
//!   interprets them

use crate::errors::EngineError;
use crate::fusion::{
    DerivedOutputs, EngineVersion, FusionInput, FusionState, OutputSet, SampleRate,
};
use crate::plan::AcquisitionPlan;
use crate::sample::ChannelSet;
use crate::time::Timestamp;

/// Opaque air-quality fusion library
pub trait FusionEngine {
    /// Initialise the library; must precede every other call
    fn init(&mut self) -> Result<(), EngineError>;

    /// Library version, for diagnostics
    fn version(&self) -> Result<EngineVersion, EngineError>;

    /// Subscribe `outputs` at `rate`
    ///
    /// Returns the physical channels the library will ask for.
    fn subscribe(&mut self, outputs: OutputSet, rate: SampleRate) -> Result<ChannelSet, EngineError>;

    /// What to measure next, given the current time
    fn plan_next(&mut self, now: Timestamp) -> Result<AcquisitionPlan, EngineError>;

    /// Process one batch of physical inputs
    ///
    /// Zero outputs is a valid result (warm-up, gas-only steps).
    fn process(&mut self, inputs: &[FusionInput]) -> Result<DerivedOutputs, EngineError>;

    /// Serialize the current internal state
    fn export_state(&mut self) -> Result<FusionState, EngineError>;

    /// Restore internal state from a previous export
    fn import_state(&mut self, state: &FusionState) -> Result<(), EngineError>;
}
