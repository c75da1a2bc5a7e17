use std::sync::Arc;

use crate::backend::Backend;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

// Tensor — An n-dimensional array on a specific backend
//
// Tensor<B: Backend> is generic over the backend: Tensor<CpuBackend> holds
// data in host memory, an accelerator backend holds it in device memory.
//
// MEMORY MODEL:
//
//   Tensor is a handle: the inner data is behind Arc, so cloning a tensor
//   is a refcount bump. Views (narrow, chunk) share the same storage Arc
//   with a different layout; nothing is copied until an operation needs
//   dense memory (contiguous, cat). Storage is never mutated after
//   creation, which is what makes tensors freely shareable across threads.

/// Inner data of a tensor, shared via Arc.
struct TensorInner<B: Backend> {
    /// The raw data on the backend's device. Shared between views.
    storage: Arc<B::Storage>,
    /// Memory layout: shape + strides + offset into the storage.
    layout: Layout,
    /// Data type of the elements.
    dtype: DType,
    /// The device this tensor lives on.
    device: B::Device,
}

/// An n-dimensional array of numbers on a specific backend.
///
/// # Type Parameter
/// - `B: Backend` — the storage backend (e.g. `CpuBackend`)
pub struct Tensor<B: Backend> {
    inner: Arc<TensorInner<B>>,
}

// Manual Clone: Arc::clone is cheap (just a refcount increment).
impl<B: Backend> Clone for Tensor<B> {
    fn clone(&self) -> Self {
        Tensor {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Tensor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tensor(shape={}, dtype={}, device={:?})",
            self.inner.layout.shape(),
            self.inner.dtype,
            self.inner.device,
        )
    }
}

impl<B: Backend> Tensor<B> {
    /// Create a tensor from existing storage and layout.
    fn from_storage(storage: B::Storage, layout: Layout, dtype: DType, device: B::Device) -> Self {
        Tensor {
            inner: Arc::new(TensorInner {
                storage: Arc::new(storage),
                layout,
                dtype,
                device,
            }),
        }
    }

    /// Create a view sharing the same storage with a different layout.
    fn view_with_layout(&self, layout: Layout) -> Self {
        Tensor {
            inner: Arc::new(TensorInner {
                storage: Arc::clone(&self.inner.storage),
                layout,
                dtype: self.inner.dtype,
                device: self.inner.device.clone(),
            }),
        }
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        self.inner.layout.shape()
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.inner.layout.dims()
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.inner.layout.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.inner.layout.elem_count()
    }

    /// Data type of the elements.
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// The device this tensor is on.
    pub fn device(&self) -> &B::Device {
        &self.inner.device
    }

    /// The memory layout (shape + strides + offset).
    pub fn layout(&self) -> &Layout {
        &self.inner.layout
    }

    /// Whether this tensor is contiguous in memory.
    pub fn is_contiguous(&self) -> bool {
        self.inner.layout.is_contiguous()
    }

    /// Whether two handles view the same underlying storage buffer.
    pub fn same_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner.storage, &other.inner.storage)
    }

    // Creation

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType, device: &B::Device) -> Result<Self> {
        let shape = shape.into();
        let layout = Layout::contiguous(shape.clone());
        let storage = B::zeros(&shape, dtype, device)?;
        Ok(Self::from_storage(storage, layout, dtype, device.clone()))
    }

    /// Create a tensor from a flat slice of f64 values, converted to `dtype`.
    pub fn from_f64_slice(
        data: &[f64],
        shape: impl Into<Shape>,
        dtype: DType,
        device: &B::Device,
    ) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                shape: shape.clone(),
                expected: shape.elem_count(),
                got: data.len(),
            });
        }
        let layout = Layout::contiguous(shape);
        let storage = B::from_f64_slice(data, dtype, device)?;
        Ok(Self::from_storage(storage, layout, dtype, device.clone()))
    }

    /// Create a tensor with random uniform values in [0, 1).
    pub fn rand(shape: impl Into<Shape>, dtype: DType, device: &B::Device) -> Result<Self> {
        let shape = shape.into();
        let layout = Layout::contiguous(shape.clone());
        let storage = B::rand_uniform(&shape, dtype, device)?;
        Ok(Self::from_storage(storage, layout, dtype, device.clone()))
    }

    // Views

    /// Narrow (slice) along a dimension. Zero-copy: the result shares this
    /// tensor's storage.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        let new_layout = self.inner.layout.narrow(dim, start, len)?;
        Ok(self.view_with_layout(new_layout))
    }

    /// Split a tensor into `n` chunks along a dimension.
    ///
    /// Chunks are equal-sized views when the dimension divides evenly by
    /// `n`; otherwise the last chunk is smaller.
    pub fn chunk(&self, n: usize, dim: usize) -> Result<Vec<Self>> {
        if dim >= self.rank() {
            return Err(Error::DimOutOfRange {
                dim,
                rank: self.rank(),
            });
        }
        let dim_size = self.dims()[dim];
        let chunk_size = dim_size.div_ceil(n);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < dim_size {
            let len = chunk_size.min(dim_size - start);
            chunks.push(self.narrow(dim, start, len)?);
            start += len;
        }
        Ok(chunks)
    }

    /// Reshape to a new shape with the same total element count.
    /// A non-contiguous tensor is made contiguous first.
    pub fn reshape(&self, new_shape: impl Into<Shape>) -> Result<Self> {
        let new_shape = new_shape.into();
        let current_count = self.elem_count();
        let new_count = new_shape.elem_count();
        if current_count != new_count {
            return Err(Error::ReshapeElementMismatch {
                src: current_count,
                dst: new_count,
                dst_shape: new_shape,
            });
        }
        let tensor = if self.is_contiguous() {
            self.clone()
        } else {
            self.contiguous()?
        };
        let new_layout = Layout::contiguous(new_shape);
        Ok(tensor.view_with_layout(new_layout))
    }

    /// Ensure the tensor is contiguous in memory.
    /// If already contiguous, returns a clone (cheap Arc copy); otherwise
    /// copies the data into new dense storage.
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        let new_storage = B::to_contiguous(&self.inner.storage, &self.inner.layout)?;
        let new_layout = Layout::contiguous(self.shape().clone());
        Ok(Self::from_storage(
            new_storage,
            new_layout,
            self.inner.dtype,
            self.inner.device.clone(),
        ))
    }

    // Combination

    /// Concatenate tensors along a dimension.
    ///
    /// All tensors must agree in rank, dtype, and every dimension except
    /// `dim`. The result is a fresh contiguous tensor; the inputs are left
    /// untouched.
    pub fn cat(tensors: &[Self], dim: usize) -> Result<Self> {
        if tensors.is_empty() {
            return Err(Error::msg("cat: empty tensor list"));
        }
        if tensors.len() == 1 {
            return Ok(tensors[0].clone());
        }

        let first = &tensors[0];
        let rank = first.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }

        for (i, t) in tensors.iter().enumerate().skip(1) {
            if t.rank() != rank {
                return Err(Error::msg(format!(
                    "cat: tensor {} has rank {} but expected {}",
                    i,
                    t.rank(),
                    rank
                )));
            }
            if t.dtype() != first.dtype() {
                return Err(Error::DTypeMismatch {
                    expected: first.dtype(),
                    got: t.dtype(),
                });
            }
            for d in 0..rank {
                if d != dim && t.dims()[d] != first.dims()[d] {
                    return Err(Error::msg(format!(
                        "cat: tensor {} has size {} at dim {} but expected {}",
                        i,
                        t.dims()[d],
                        d,
                        first.dims()[d]
                    )));
                }
            }
        }

        let cat_size: usize = tensors.iter().map(|t| t.dims()[dim]).sum();
        let mut out_dims = first.dims().to_vec();
        out_dims[dim] = cat_size;
        let out_shape = Shape::new(out_dims);

        let pairs: Vec<(&B::Storage, &Layout)> = tensors
            .iter()
            .map(|t| (&*t.inner.storage, &t.inner.layout))
            .collect();

        let storage = B::cat(&pairs, &out_shape, dim)?;
        let layout = Layout::contiguous(out_shape);
        Ok(Self::from_storage(
            storage,
            layout,
            first.dtype(),
            first.device().clone(),
        ))
    }

    // Host transfer

    /// Copy the tensor's data to a Vec<f64> on the host, in logical order.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        B::to_f64_vec(&self.inner.storage, &self.inner.layout)
    }
}
