use crate::dtype::DType;
use crate::error::Result;
use crate::layout::Layout;
use crate::shape::Shape;
use std::fmt;

// Backend — Abstraction over compute devices (CPU, ROCm, ...)
//
// Each backend implements this trait with its own device and storage types.
// Using a trait (vs. a device enum) means new backends can live in separate
// crates without touching vole-core, and each backend picks its own storage
// representation. The tradeoff is that Tensor is generic: Tensor<B>.
//
// The trait carries only the data-movement operations the parameter-layout
// paths need: allocation, host transfer, concatenation, and densification
// of views. Compute kernels belong to the backends' own crates.

/// Identifies a compute device (e.g., "cpu", "rocm:0").
pub trait BackendDevice: Clone + fmt::Debug + Send + Sync + 'static {
    /// A human-readable name for this device.
    fn name(&self) -> String;

    /// Whether tensors on this device live in accelerator memory.
    ///
    /// Vendor-library eligibility checks key off this: a tensor qualifies
    /// for accelerated execution only when it is resident where the
    /// library's kernels can reach it.
    fn is_accelerator(&self) -> bool;
}

/// A storage buffer that holds tensor data on a specific device.
pub trait BackendStorage: Clone + Send + Sync + 'static {
    /// The data type of the elements in this storage.
    fn dtype(&self) -> DType;

    /// Total number of elements in this storage.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The main Backend trait. Implementing this for a struct (e.g. CpuBackend)
/// makes that struct a complete storage backend for Vole.
///
/// All operations take storage plus a layout (which encodes shape, strides,
/// and offset) and return new storage; nothing mutates in place.
pub trait Backend: Clone + Send + Sync + fmt::Debug + 'static {
    /// The device type for this backend.
    type Device: BackendDevice;
    /// The storage type for this backend.
    type Storage: BackendStorage;

    /// Allocate storage filled with zeros.
    fn zeros(shape: &Shape, dtype: DType, device: &Self::Device) -> Result<Self::Storage>;

    /// Create storage from a flat f64 slice, converting to the target dtype.
    fn from_f64_slice(data: &[f64], dtype: DType, device: &Self::Device) -> Result<Self::Storage>;

    /// Create storage with random uniform values in [0, 1).
    fn rand_uniform(shape: &Shape, dtype: DType, device: &Self::Device) -> Result<Self::Storage>;

    /// Concatenate multiple storages along `dim` into a single contiguous
    /// storage. Each entry is (storage, layout) so non-contiguous inputs
    /// (gate-block views, in particular) are handled correctly.
    /// `out_shape` is the pre-validated output shape.
    fn cat(
        inputs: &[(&Self::Storage, &Layout)],
        out_shape: &Shape,
        dim: usize,
    ) -> Result<Self::Storage>;

    /// Make a contiguous copy of the storage following the given layout.
    /// If the layout is already contiguous, this may just clone the storage.
    fn to_contiguous(input: &Self::Storage, layout: &Layout) -> Result<Self::Storage>;

    /// Copy data to a Vec<f64> on the host, in logical order (for inspection).
    fn to_f64_vec(input: &Self::Storage, layout: &Layout) -> Result<Vec<f64>>;
}
