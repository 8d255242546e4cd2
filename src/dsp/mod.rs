// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Signal-processing stages and the pipeline that chains them.
//!
//! Every stage implements [`Stage`]: it declares the shape of the buffer it
//! consumes and produces, and transforms one chunk per call. Stages with
//! memory (oscillator phase, filter tails, symbol timing) carry it across
//! chunks, so feeding a signal in pieces gives the same result as feeding it
//! whole. A [`Pipeline`] is an ordered list of stages whose shapes were
//! checked to line up when it was built.
//!
//! The encoder and decoder graphs are described in [`graph`].

pub mod combine;
pub mod demod;
pub mod fir;
pub mod gfsk;
pub mod graph;
pub mod translate;

use num_complex::Complex64;
use tracing::trace;

use crate::stego::bits::BitStream;
use crate::stego::error::StegoError;

/// Kind of data carried between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// One bit per symbol.
    Bits,
    /// Real-valued samples.
    Real,
    /// Complex baseband samples.
    Complex,
}

/// A buffer moving through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Bits(BitStream),
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Buffer {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Bits(_) => Shape::Bits,
            Self::Real(_) => Shape::Real,
            Self::Complex(_) => Shape::Complex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bits(b) => b.len(),
            Self::Real(r) => r.len(),
            Self::Complex(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty buffer of the given shape.
    pub fn empty(shape: Shape) -> Self {
        match shape {
            Shape::Bits => Self::Bits(BitStream::new()),
            Shape::Real => Self::Real(Vec::new()),
            Shape::Complex => Self::Complex(Vec::new()),
        }
    }

    /// Append `other`, which must have the same shape.
    pub fn append(&mut self, other: Buffer) -> Result<(), StegoError> {
        match (self, other) {
            (Self::Bits(a), Self::Bits(b)) => a.extend(b.iter()),
            (Self::Real(a), Self::Real(b)) => a.extend(b),
            (Self::Complex(a), Self::Complex(b)) => a.extend(b),
            _ => return Err(StegoError::UnexpectedBuffer { stage: "pipeline" }),
        }
        Ok(())
    }

    pub fn into_bits(self, stage: &'static str) -> Result<BitStream, StegoError> {
        match self {
            Self::Bits(b) => Ok(b),
            _ => Err(StegoError::UnexpectedBuffer { stage }),
        }
    }

    pub fn into_real(self, stage: &'static str) -> Result<Vec<f64>, StegoError> {
        match self {
            Self::Real(r) => Ok(r),
            _ => Err(StegoError::UnexpectedBuffer { stage }),
        }
    }

    pub fn into_complex(self, stage: &'static str) -> Result<Vec<Complex64>, StegoError> {
        match self {
            Self::Complex(c) => Ok(c),
            _ => Err(StegoError::UnexpectedBuffer { stage }),
        }
    }
}

/// Static description of a stage's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub name: &'static str,
    pub input: Shape,
    pub output: Shape,
}

/// One step of a signal-processing graph.
pub trait Stage {
    fn descriptor(&self) -> StageDescriptor;

    /// Transform the next chunk of the signal.
    ///
    /// # Errors
    /// [`StegoError::UnexpectedBuffer`] when `input` has the wrong shape;
    /// stages with side outputs may also report I/O failures.
    fn process(&mut self, input: Buffer) -> Result<Buffer, StegoError>;

    /// Emit whatever the stage still holds once its input is exhausted, and
    /// reset it for a new signal.
    fn finish(&mut self) -> Result<Buffer, StegoError> {
        Ok(Buffer::empty(self.descriptor().output))
    }
}

/// A shape-checked chain of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.descriptor().name))
            .finish()
    }
}

impl Pipeline {
    /// Connect `stages` in order.
    ///
    /// # Errors
    /// [`StegoError::PipelineMismatch`] if a stage's output shape differs
    /// from the next stage's input shape.
    pub fn build(stages: Vec<Box<dyn Stage>>) -> Result<Self, StegoError> {
        for pair in stages.windows(2) {
            let (up, down) = (pair[0].descriptor(), pair[1].descriptor());
            if up.output != down.input {
                return Err(StegoError::PipelineMismatch {
                    upstream: up.name,
                    downstream: down.name,
                });
            }
        }
        Ok(Self { stages })
    }

    /// Descriptors of every stage, in order.
    pub fn descriptors(&self) -> Vec<StageDescriptor> {
        self.stages.iter().map(|s| s.descriptor()).collect()
    }

    pub fn input_shape(&self) -> Option<Shape> {
        self.stages.first().map(|s| s.descriptor().input)
    }

    pub fn output_shape(&self) -> Option<Shape> {
        self.stages.last().map(|s| s.descriptor().output)
    }

    /// Feed `input` as a single chunk and drain the pipeline.
    pub fn run(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let mut out = self.feed(input)?;
        if let Some(rest) = self.finish()? {
            out.append(rest)?;
        }
        Ok(out)
    }

    /// Drain every stage in order, pushing what each one held back through
    /// the stages after it. `None` for an empty pipeline.
    pub fn finish(&mut self) -> Result<Option<Buffer>, StegoError> {
        let mut carried: Option<Buffer> = None;
        for stage in &mut self.stages {
            let mut out = match carried.take() {
                Some(buffer) => stage.process(buffer)?,
                None => Buffer::empty(stage.descriptor().output),
            };
            out.append(stage.finish()?)?;
            carried = Some(out);
        }
        Ok(carried)
    }

    /// Feed the next chunk of the input through every stage.
    pub fn feed(&mut self, input: Buffer) -> Result<Buffer, StegoError> {
        let mut buffer = input;
        for stage in &mut self.stages {
            let desc = stage.descriptor();
            if buffer.shape() != desc.input {
                return Err(StegoError::UnexpectedBuffer { stage: desc.name });
            }
            let in_len = buffer.len();
            buffer = stage.process(buffer)?;
            trace!(
                stage = desc.name,
                in_len,
                out_len = buffer.len(),
                "stage done"
            );
        }
        Ok(buffer)
    }
}
