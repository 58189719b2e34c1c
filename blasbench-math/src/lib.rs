//! Benchmark and verification harness for dense and packed BLAS routines.
//!
//! A [`routine`] owns the host operands of one call. The [`harness`] gates it against the
//! device limits, uploads it, times it through the [`blas`] dispatch layer and checks the
//! output against the host [`reference`].

/// Per-element-kind routine dispatch onto devices
pub mod blas;

/// Operand shapes and the buffer lengths they need
pub mod descriptor;

pub mod element;
pub mod error;

/// Pre-allocation resource checks
pub mod gate;

pub mod harness;

/// Host operand buffers and their pseudorandom generation
pub mod host;

pub mod layout;
pub mod operand;

/// Column-major host reference implementations
pub mod reference;

pub mod routine;

pub use blasbench_sys as sys;
