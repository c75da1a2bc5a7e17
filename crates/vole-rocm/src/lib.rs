// ROCm/MIOpen integration — capability detection and parameter layout
//
// This crate decides whether tensors may be dispatched to AMD's MIOpen
// acceleration library, and how recurrent-network parameters must be
// arranged to match MIOpen's expectations. It performs no native calls
// itself: the kernels live behind the dispatch code that consumes these
// answers, and whether the library is linked at all is a build-time fact
// surfaced through the `miopen` cargo feature.
//
// Everything here is a pure function of its inputs plus that one
// build-time flag. No state, no locks; safe to call from any thread.

pub mod rnn;

pub use rnn::{
    flatten_rnn_weights, permute_rnn_weights, rnn_mode_code, RnnAlgo, RnnBiasMode, RnnDescriptor,
    RnnDirection, RnnInputMode, RnnMode,
};

use vole_core::backend::{Backend, BackendDevice};
use vole_core::{DType, Tensor};

/// DTypes eligible for MIOpen dispatch. Accelerator-resident tensors of
/// any other dtype fall back to the generic kernels.
pub const MIOPEN_DTYPES: [DType; 2] = [DType::F16, DType::F32];

/// The one dtype the MIOpen recurrent kernels accept. Narrower than
/// [`MIOPEN_DTYPES`]: the RNN entry points have no half-precision path.
pub const MIOPEN_RNN_DTYPE: DType = DType::F32;

/// Returns whether this build links MIOpen.
///
/// Fixed at compile time, so callers may cache the result freely.
pub fn is_available() -> bool {
    cfg!(feature = "miopen")
}

/// Capability handle for MIOpen dispatch decisions.
///
/// Holds the availability flag as plain data rather than reading a global,
/// so dispatch code receives it at construction and tests can exercise
/// both the available and unavailable states in a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Miopen {
    available: bool,
}

impl Miopen {
    /// Capability handle reflecting this build: available iff the `miopen`
    /// feature is enabled.
    pub fn from_build() -> Self {
        Miopen {
            available: is_available(),
        }
    }

    /// Capability handle with an explicit availability flag.
    pub fn with_availability(available: bool) -> Self {
        Miopen { available }
    }

    /// Whether MIOpen is available to this handle.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Whether `tensor` qualifies for MIOpen-accelerated execution.
    ///
    /// True iff MIOpen is available, the tensor is accelerator-resident,
    /// and its dtype is in [`MIOPEN_DTYPES`]. Ineligibility is a normal
    /// outcome, reported as `false`; this never fails.
    pub fn is_acceptable<B: Backend>(&self, tensor: &Tensor<B>) -> bool {
        self.available
            && tensor.device().is_accelerator()
            && MIOPEN_DTYPES.contains(&tensor.dtype())
    }

    /// Whether `tensor` qualifies for the MIOpen recurrent kernels.
    ///
    /// Stricter than [`Miopen::is_acceptable`]: only
    /// [`MIOPEN_RNN_DTYPE`] (f32) passes, since the recurrent kernels
    /// have no half-precision support.
    pub fn is_rnn_acceptable<B: Backend>(&self, tensor: &Tensor<B>) -> bool {
        self.available
            && tensor.device().is_accelerator()
            && tensor.dtype() == MIOPEN_RNN_DTYPE
    }
}

impl Default for Miopen {
    fn default() -> Self {
        Self::from_build()
    }
}
