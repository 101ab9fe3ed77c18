//! Error taxonomy for the machine and its collaborators.
//!
//! Fatal conditions (`MachineError`) stop the machine and carry the offending
//! opcode, address, or instruction pointer for the diagnostic. An empty input
//! queue is not an error at all: it surfaces as `InputError::Empty`, which the
//! machine converts into a resumable suspension.

use thiserror::Error;

use crate::memory::Word;

/// Unrecoverable faults. Once one of these is returned the machine is in the
/// `Fatal` state and stays there.
#[derive(Error, Debug)]
pub enum MachineError {
  #[error("unknown opcode {opcode} at address {address}")]
  UnknownOpcode { opcode: Word, address: usize },

  #[error("unknown parameter mode {mode} in instruction word {word} at address {address}")]
  UnknownParameterMode { mode: Word, word: Word, address: usize },

  #[error("negative memory address {address} resolved at instruction pointer {ip}")]
  NegativeAddress { address: Word, ip: usize },

  #[error("write target resolved in immediate mode at instruction pointer {ip}")]
  ImmediateWriteTarget { ip: usize },

  #[error("input queue drained before the program halted, at instruction pointer {ip}")]
  InputExhausted { ip: usize },

  #[error(transparent)]
  Device(#[from] DeviceFault),
}

/// Raised by a device that cannot service a request. The machine imposes no
/// recovery policy; the fault is propagated to the driver as-is.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DeviceFault {
  message: String,
}

impl DeviceFault {
  pub fn new<S: Into<String>>(message: S) -> DeviceFault {
    DeviceFault { message: message.into() }
  }
}

/// Outcome of asking a channel for input when no value could be produced.
#[derive(Error, Debug)]
pub enum InputError {
  /// No value is ready yet. Recoverable: supply more input and resume.
  #[error("no input value is currently available")]
  Empty,

  /// The underlying device failed. Fatal to the machine.
  #[error(transparent)]
  Fault(#[from] DeviceFault),
}

/// Failures turning program text into a program.
#[derive(Error, Debug)]
pub enum ParseError {
  #[error("program text is not a comma-separated list of integers, near '{fragment}'")]
  Malformed { fragment: String },

  #[error("integer literal '{literal}' does not fit in a 64 bit word")]
  Overflow { literal: String },

  #[error("program text contains no instructions")]
  EmptyProgram,

  #[error("cannot read program file: {0}")]
  Unreadable(#[from] std::io::Error),
}
