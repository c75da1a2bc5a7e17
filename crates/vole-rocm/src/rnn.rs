// RNN parameter layout for MIOpen
//
// MIOpen's recurrent kernels identify the cell variant by a small integer
// (miopenRNNMode_t) and expect gate-blocked weight matrices in their own
// internal gate order, which differs from the framework convention for
// LSTM and GRU:
//
//   LSTM framework order: [input, forget, cell, output]
//   LSTM MIOpen order:    [input, forget, output, cell]   (swap blocks 2,3)
//   GRU framework order:  [reset, update, new]
//   GRU MIOpen order:     [update, reset, new]            (swap blocks 0,1)
//
// The vanilla RNN cells have a single undivided weight block, so no
// reordering applies to them.

use std::fmt;
use std::str::FromStr;

use vole_core::backend::Backend;
use vole_core::{bail, DType, Error, Result, Tensor};

// RnnMode — The four recurrent cell variants MIOpen knows

/// Recurrent cell variant, with the integer code MIOpen identifies it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RnnMode {
    /// Vanilla RNN with ReLU activation.
    RnnRelu,
    /// Vanilla RNN with tanh activation.
    RnnTanh,
    Lstm,
    Gru,
}

impl RnnMode {
    /// Resolve a mode from its canonical name.
    ///
    /// Exactly four names are recognized: `"RNN_RELU"`, `"RNN_TANH"`,
    /// `"LSTM"`, `"GRU"`. Matching is exact; no case normalization.
    /// Anything else is [`Error::UnrecognizedRnnMode`], carrying the
    /// offending input.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "RNN_RELU" => Ok(RnnMode::RnnRelu),
            "RNN_TANH" => Ok(RnnMode::RnnTanh),
            "LSTM" => Ok(RnnMode::Lstm),
            "GRU" => Ok(RnnMode::Gru),
            _ => Err(Error::UnrecognizedRnnMode(name.to_string())),
        }
    }

    /// The miopenRNNMode_t value for this variant. The ordering is an ABI
    /// contract with the native library, not a choice made here.
    pub fn code(self) -> i32 {
        match self {
            RnnMode::RnnRelu => 0,
            RnnMode::RnnTanh => 1,
            RnnMode::Lstm => 2,
            RnnMode::Gru => 3,
        }
    }

    /// Number of gate blocks in this cell's weight matrices.
    pub fn gate_count(self) -> usize {
        match self {
            RnnMode::RnnRelu | RnnMode::RnnTanh => 1,
            RnnMode::Lstm => 4,
            RnnMode::Gru => 3,
        }
    }
}

impl FromStr for RnnMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for RnnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RnnMode::RnnRelu => "RNN_RELU",
            RnnMode::RnnTanh => "RNN_TANH",
            RnnMode::Lstm => "LSTM",
            RnnMode::Gru => "GRU",
        };
        write!(f, "{}", s)
    }
}

/// Resolve a cell-kind name straight to its MIOpen mode code.
pub fn rnn_mode_code(name: &str) -> Result<i32> {
    Ok(RnnMode::from_name(name)?.code())
}

// Weight permutation

/// Reorder the gate blocks of a recurrent weight tensor from the framework
/// convention into MIOpen's internal gate order.
///
/// The tensor is split into `gate_count` equal blocks along dim 0 and
/// reassembled into a fresh tensor; the input is never mutated. For the
/// single-block vanilla RNN modes the input handle is returned as-is.
///
/// The leading dimension is assumed divisible by the gate count; an uneven
/// split is the caller's precondition failure and produces ragged blocks.
pub fn permute_rnn_weights<B: Backend>(mode: RnnMode, weights: &Tensor<B>) -> Result<Tensor<B>> {
    match mode {
        RnnMode::Lstm => {
            let g = weights.chunk(4, 0)?;
            Tensor::cat(&[g[0].clone(), g[1].clone(), g[3].clone(), g[2].clone()], 0)
        }
        RnnMode::Gru => {
            let g = weights.chunk(3, 0)?;
            Tensor::cat(&[g[1].clone(), g[0].clone(), g[2].clone()], 0)
        }
        RnnMode::RnnRelu | RnnMode::RnnTanh => Ok(weights.clone()),
    }
}

/// Pack per-layer weight tensors into one flat parameter buffer in MIOpen
/// gate order.
///
/// Each tensor is gate-permuted via [`permute_rnn_weights`], flattened,
/// and the pieces are concatenated in the given order. All tensors must
/// share a dtype (enforced by the concatenation).
pub fn flatten_rnn_weights<B: Backend>(mode: RnnMode, weights: &[Tensor<B>]) -> Result<Tensor<B>> {
    if weights.is_empty() {
        bail!("flatten_rnn_weights: cannot flatten empty weight list");
    }
    let mut flat = Vec::with_capacity(weights.len());
    for w in weights {
        let permuted = permute_rnn_weights(mode, w)?;
        flat.push(permuted.reshape(permuted.elem_count())?);
    }
    Tensor::cat(&flat, 0)
}

// RnnDescriptor — Parameter bundle for the native RNN entry points
//
// Mirrors what the native library's descriptor is configured with. Pure
// data; the actual descriptor construction happens on the other side of
// the dispatch boundary.

/// Sequence direction of the recurrent network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnnDirection {
    Unidirectional,
    Bidirectional,
}

impl RnnDirection {
    /// The miopenRNNDirectionMode_t value.
    pub fn code(self) -> i32 {
        match self {
            RnnDirection::Unidirectional => 0,
            RnnDirection::Bidirectional => 1,
        }
    }
}

/// How the first layer consumes its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnnInputMode {
    /// Input is multiplied by the first layer's input weights.
    Linear,
    /// Input is fed through unchanged (requires input_size == hidden_size).
    Skip,
}

impl RnnInputMode {
    /// The miopenRNNInputMode_t value.
    pub fn code(self) -> i32 {
        match self {
            RnnInputMode::Linear => 0,
            RnnInputMode::Skip => 1,
        }
    }
}

/// Whether the cells carry bias vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnnBiasMode {
    NoBias,
    WithBias,
}

impl RnnBiasMode {
    /// The miopenRNNBiasMode_t value.
    pub fn code(self) -> i32 {
        match self {
            RnnBiasMode::NoBias => 0,
            RnnBiasMode::WithBias => 1,
        }
    }
}

/// Algorithm selector for the recurrent kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnnAlgo {
    Default,
}

impl RnnAlgo {
    /// The miopenRNNAlgo_t value.
    pub fn code(self) -> i32 {
        match self {
            RnnAlgo::Default => 0,
        }
    }
}

/// Everything the native RNN descriptor is configured with.
///
/// Defaults follow the native library's: unidirectional, linear input,
/// no bias, default algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RnnDescriptor {
    pub mode: RnnMode,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dtype: DType,
    pub direction: RnnDirection,
    pub input_mode: RnnInputMode,
    pub bias_mode: RnnBiasMode,
    pub algo: RnnAlgo,
}

impl RnnDescriptor {
    pub fn new(mode: RnnMode, hidden_size: usize, num_layers: usize, dtype: DType) -> Self {
        RnnDescriptor {
            mode,
            hidden_size,
            num_layers,
            dtype,
            direction: RnnDirection::Unidirectional,
            input_mode: RnnInputMode::Linear,
            bias_mode: RnnBiasMode::NoBias,
            algo: RnnAlgo::Default,
        }
    }

    pub fn set_bidirectional(&mut self, bidirectional: bool) {
        self.direction = if bidirectional {
            RnnDirection::Bidirectional
        } else {
            RnnDirection::Unidirectional
        };
    }

    pub fn set_algo(&mut self, algo: RnnAlgo) {
        self.algo = algo;
    }

    /// 1 for unidirectional, 2 for bidirectional.
    pub fn num_directions(&self) -> usize {
        match self.direction {
            RnnDirection::Unidirectional => 1,
            RnnDirection::Bidirectional => 2,
        }
    }

    /// Rows of a gate-blocked weight matrix for this descriptor:
    /// gate_count * hidden_size.
    pub fn gate_rows(&self) -> usize {
        self.mode.gate_count() * self.hidden_size
    }
}
