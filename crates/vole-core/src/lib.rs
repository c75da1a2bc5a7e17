//! # vole-core
//!
//! Core tensor primitives and types for Vole.
//!
//! This crate provides:
//! - [`Tensor`] — n-dimensional array handle with zero-copy views
//! - [`Shape`] / [`Layout`] — shape, strides, and memory layout
//! - [`DType`] — element data types (F16, BF16, F32, F64)
//! - [`Backend`] trait — abstraction over storage devices (CPU, ROCm, ...)
//! - [`Error`] / [`Result`] — the single error type used across the workspace

pub mod backend;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod shape;
pub mod tensor;

pub use backend::{Backend, BackendDevice, BackendStorage};
pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use layout::Layout;
pub use shape::Shape;
pub use tensor::Tensor;
