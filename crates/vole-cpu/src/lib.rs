// CPU Backend — Host-memory storage backend
//
// The reference implementation of the Vole Backend trait. Data lives in
// plain Vecs, one storage variant per dtype. All operations work through
// the layout's strided indices, so views (narrowed gate blocks, in
// particular) are handled without materializing them first.

use half::{bf16, f16};
use rand::Rng;

use vole_core::backend::{Backend, BackendDevice, BackendStorage};
use vole_core::dtype::{DType, WithDType};
use vole_core::error::{Error, Result};
use vole_core::layout::Layout;
use vole_core::shape::Shape;
use vole_core::tensor::Tensor;

/// The host device. There is only one, so this is a unit struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuDevice;

impl BackendDevice for CpuDevice {
    fn name(&self) -> String {
        "cpu".to_string()
    }

    fn is_accelerator(&self) -> bool {
        false
    }
}

// CpuStorage — One Vec per supported dtype

/// Host-side storage. Each variant wraps a Vec of the corresponding
/// element type.
#[derive(Debug, Clone)]
pub enum CpuStorage {
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl BackendStorage for CpuStorage {
    fn dtype(&self) -> DType {
        match self {
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::BF16(_) => DType::BF16,
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F64(_) => DType::F64,
        }
    }

    fn len(&self) -> usize {
        match self {
            CpuStorage::F16(v) => v.len(),
            CpuStorage::BF16(v) => v.len(),
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F64(v) => v.len(),
        }
    }
}

// Helpers — generic over the element type via WithDType

fn vec_from_f64<T: WithDType>(data: &[f64]) -> Vec<T> {
    data.iter().map(|&v| T::from_f64(v)).collect()
}

fn rand_vec<T: WithDType>(n: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| T::from_f64(rng.gen::<f64>())).collect()
}

/// Gather the elements of a (possibly non-contiguous) view into a dense
/// Vec in logical order.
fn gather<T: Copy>(data: &[T], layout: &Layout) -> Vec<T> {
    layout.strided_indices().map(|i| data[i]).collect()
}

fn gather_f64<T: WithDType>(data: &[T], layout: &Layout) -> Vec<f64> {
    layout
        .strided_indices()
        .map(|i| data[i].to_f64())
        .collect()
}

/// Concatenate dense per-input buffers along `dim`.
///
/// Decomposes the output as [outer, dim, inner] blocks; each input
/// contributes `this_dim * inner` consecutive elements per outer index.
fn cat_vecs<T: WithDType>(parts: &[(Vec<T>, usize)], out_shape: &Shape, dim: usize) -> Vec<T> {
    let out_dims = out_shape.dims();
    let outer: usize = out_dims[..dim].iter().product::<usize>().max(1);
    let total_dim = out_dims[dim];
    let inner: usize = out_dims[dim + 1..].iter().product::<usize>().max(1);

    let mut out = vec![T::zero(); out_shape.elem_count()];
    let mut dim_offset = 0;
    for (data, this_dim) in parts {
        let this_dim = *this_dim;
        for o in 0..outer {
            let src = o * this_dim * inner;
            let dst = (o * total_dim + dim_offset) * inner;
            out[dst..dst + this_dim * inner].copy_from_slice(&data[src..src + this_dim * inner]);
        }
        dim_offset += this_dim;
    }
    out
}

// Backend implementation

/// The CPU storage backend.
#[derive(Debug, Clone, Copy)]
pub struct CpuBackend;

/// Tensor on the CPU backend.
pub type CpuTensor = Tensor<CpuBackend>;

impl Backend for CpuBackend {
    type Device = CpuDevice;
    type Storage = CpuStorage;

    fn zeros(shape: &Shape, dtype: DType, _device: &CpuDevice) -> Result<CpuStorage> {
        let n = shape.elem_count();
        Ok(match dtype {
            DType::F16 => CpuStorage::F16(vec![f16::zero(); n]),
            DType::BF16 => CpuStorage::BF16(vec![bf16::zero(); n]),
            DType::F32 => CpuStorage::F32(vec![0f32; n]),
            DType::F64 => CpuStorage::F64(vec![0f64; n]),
        })
    }

    fn from_f64_slice(data: &[f64], dtype: DType, _device: &CpuDevice) -> Result<CpuStorage> {
        Ok(match dtype {
            DType::F16 => CpuStorage::F16(vec_from_f64(data)),
            DType::BF16 => CpuStorage::BF16(vec_from_f64(data)),
            DType::F32 => CpuStorage::F32(vec_from_f64(data)),
            DType::F64 => CpuStorage::F64(data.to_vec()),
        })
    }

    fn rand_uniform(shape: &Shape, dtype: DType, _device: &CpuDevice) -> Result<CpuStorage> {
        let n = shape.elem_count();
        Ok(match dtype {
            DType::F16 => CpuStorage::F16(rand_vec(n)),
            DType::BF16 => CpuStorage::BF16(rand_vec(n)),
            DType::F32 => CpuStorage::F32(rand_vec(n)),
            DType::F64 => CpuStorage::F64(rand_vec(n)),
        })
    }

    fn cat(
        inputs: &[(&CpuStorage, &Layout)],
        out_shape: &Shape,
        dim: usize,
    ) -> Result<CpuStorage> {
        let first = match inputs.first() {
            Some((s, _)) => s,
            None => return Err(Error::msg("cat: empty input list")),
        };
        let expected = first.dtype();

        macro_rules! cat_as {
            ($variant:ident) => {{
                let mut parts = Vec::with_capacity(inputs.len());
                for &(storage, layout) in inputs {
                    let data = match storage {
                        CpuStorage::$variant(v) => v.as_slice(),
                        other => {
                            return Err(Error::DTypeMismatch {
                                expected,
                                got: other.dtype(),
                            })
                        }
                    };
                    parts.push((gather(data, layout), layout.dims()[dim]));
                }
                Ok(CpuStorage::$variant(cat_vecs(&parts, out_shape, dim)))
            }};
        }

        match first {
            CpuStorage::F16(_) => cat_as!(F16),
            CpuStorage::BF16(_) => cat_as!(BF16),
            CpuStorage::F32(_) => cat_as!(F32),
            CpuStorage::F64(_) => cat_as!(F64),
        }
    }

    fn to_contiguous(input: &CpuStorage, layout: &Layout) -> Result<CpuStorage> {
        if layout.is_contiguous() {
            return Ok(input.clone());
        }
        Ok(match input {
            CpuStorage::F16(v) => CpuStorage::F16(gather(v, layout)),
            CpuStorage::BF16(v) => CpuStorage::BF16(gather(v, layout)),
            CpuStorage::F32(v) => CpuStorage::F32(gather(v, layout)),
            CpuStorage::F64(v) => CpuStorage::F64(gather(v, layout)),
        })
    }

    fn to_f64_vec(input: &CpuStorage, layout: &Layout) -> Result<Vec<f64>> {
        Ok(match input {
            CpuStorage::F16(v) => gather_f64(v, layout),
            CpuStorage::BF16(v) => gather_f64(v, layout),
            CpuStorage::F32(v) => gather_f64(v, layout),
            CpuStorage::F64(v) => gather_f64(v, layout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_roundtrip() {
        let vals = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = CpuTensor::from_f64_slice(&vals, (2, 3), DType::F32, &CpuDevice).unwrap();
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.to_f64_vec().unwrap(), vals);
    }

    #[test]
    fn test_zeros() {
        let t = CpuTensor::zeros((3, 2), DType::F64, &CpuDevice).unwrap();
        assert_eq!(t.to_f64_vec().unwrap(), vec![0.0; 6]);
    }

    #[test]
    fn test_rand_range() {
        let t = CpuTensor::rand((100,), DType::F32, &CpuDevice).unwrap();
        for v in t.to_f64_vec().unwrap() {
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_narrow_reads_through_view() {
        let vals: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let t = CpuTensor::from_f64_slice(&vals, (6, 4), DType::F32, &CpuDevice).unwrap();
        let rows = t.narrow(0, 2, 2).unwrap();
        assert_eq!(rows.dims(), &[2, 4]);
        assert_eq!(
            rows.to_f64_vec().unwrap(),
            (8..16).map(|v| v as f64).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_chunk_then_cat_restores() {
        let vals: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let t = CpuTensor::from_f64_slice(&vals, (6, 4), DType::F32, &CpuDevice).unwrap();
        let chunks = t.chunk(3, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].dims(), &[2, 4]);
        let back = CpuTensor::cat(&chunks, 0).unwrap();
        assert_eq!(back.dims(), &[6, 4]);
        assert_eq!(back.to_f64_vec().unwrap(), vals);
    }

    #[test]
    fn test_cat_reorders_blocks() {
        let vals: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let t = CpuTensor::from_f64_slice(&vals, (4, 3), DType::F32, &CpuDevice).unwrap();
        let c = t.chunk(2, 0).unwrap();
        let swapped = CpuTensor::cat(&[c[1].clone(), c[0].clone()], 0).unwrap();
        assert_eq!(
            swapped.to_f64_vec().unwrap(),
            vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_cat_dtype_mismatch() {
        let a = CpuTensor::zeros((2, 2), DType::F32, &CpuDevice).unwrap();
        let b = CpuTensor::zeros((2, 2), DType::F64, &CpuDevice).unwrap();
        assert!(CpuTensor::cat(&[a, b], 0).is_err());
    }

    #[test]
    fn test_f16_precision_survives_roundtrip() {
        // Halves representable exactly in f16 come back bit-identical.
        let vals = vec![0.5, 1.5, -2.0, 0.25];
        let t = CpuTensor::from_f64_slice(&vals, (4,), DType::F16, &CpuDevice).unwrap();
        assert_eq!(t.to_f64_vec().unwrap(), vals);
    }

    #[test]
    fn test_reshape_flattens() {
        let vals: Vec<f64> = (0..8).map(|v| v as f64).collect();
        let t = CpuTensor::from_f64_slice(&vals, (2, 4), DType::F32, &CpuDevice).unwrap();
        let flat = t.reshape(8).unwrap();
        assert_eq!(flat.dims(), &[8]);
        assert_eq!(flat.to_f64_vec().unwrap(), vals);
    }
}
