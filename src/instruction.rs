/*!

  Decoding of instruction words. An instruction word packs an opcode into its
  low two decimal digits and one addressing mode per operand into the digits
  above them:

    Opcode:  word % 100
    Mode 1: (word / 100)   % 10
    Mode 2: (word / 1000)  % 10
    Mode 3: (word / 10000) % 10

  Digits the word does not have default to 0, i.e. Position mode. Operands are
  not part of the instruction word; they occupy the following cells of memory,
  one cell per operand.

  One design decision that needed to be made is whether to decode operands into
  data members of enum variants, with one variant per opcode. Operands here are
  not meaningful values until they are resolved against memory and the relative
  base, which only the machine can do, so a decoded instruction is just the
  opcode plus its three mode selectors. The enum inhabits the opcode alone, and
  the machine resolves operands at execution time.

*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::error::MachineError;
use crate::memory::Word;

/**
  Opcodes of the virtual machine.

  The discriminants are the opcode values as they appear in program text, so a
  raw opcode converts to a variant with a trivial `try_from`. An opcode with no
  variant is a fatal error surfaced to the driver, never retried.
*/
#[derive(
StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,           Eq, PartialEq,   Debug,         Hash
)]
#[repr(i64)]
pub enum Operation {
  Add         = 1,   // add( a, b, dst )
  Multiply    = 2,   // multiply( a, b, dst )
  Input       = 3,   // input( dst )
  Output      = 4,   // output( a )
  JumpIfTrue  = 5,   // jump_if_true( a, target )
  JumpIfFalse = 6,   // jump_if_false( a, target )
  LessThan    = 7,   // less_than( a, b, dst )
  Equals      = 8,   // equals( a, b, dst )
  AdjustBase  = 9,   // adjust_base( a )
  Halt        = 99,  // halt
}

impl Operation {
  pub fn code(&self) -> Word {
    Into::<Word>::into(*self)
  }

  pub fn mnemonic(&self) -> &'static str {
    (*self).into()
  }

  /// How many operand cells follow the instruction word.
  pub fn operand_count(&self) -> usize {
    match self {
      | Operation::Add
      | Operation::Multiply
      | Operation::LessThan
      | Operation::Equals      => 3,

      | Operation::JumpIfTrue
      | Operation::JumpIfFalse => 2,

      | Operation::Input
      | Operation::Output
      | Operation::AdjustBase  => 1,

      Operation::Halt          => 0,
    }
  }

  /// Instruction pointer advance for a non-jumping execution of this opcode.
  pub fn stride(&self) -> usize {
    1 + self.operand_count()
  }
}

/// Per-operand addressing mode, encoded as one decimal digit of the
/// instruction word.
#[derive(
StrumDisplay, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,             Eq, PartialEq, Debug, Hash
)]
#[repr(i64)]
pub enum ParameterMode {
  /// The operand cell holds an address; the value lives at that address.
  Position  = 0,
  /// The operand cell holds the value itself. Never legal for write targets.
  Immediate = 1,
  /// The operand cell holds an offset from the relative base register.
  Relative  = 2,
}

/// A decoded instruction word: the opcode plus one addressing mode per
/// operand slot. Created fresh each step and never persisted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Instruction {
  pub operation: Operation,
  pub modes: [ParameterMode; 3],
}

impl Instruction {
  /**
    Decodes one instruction word read from memory at `address`. The address is
    only used to label the two possible failures, unknown opcode and unknown
    mode digit, both of which are fatal.
  */
  pub fn decode(word: Word, address: usize) -> Result<Instruction, MachineError> {
    let opcode = word % 100;
    let operation = Operation::try_from(opcode)
      .map_err(|_| MachineError::UnknownOpcode { opcode, address })?;

    let mut modes = [ParameterMode::Position; 3];
    let mut digits = word / 100;
    for slot in modes.iter_mut() {
      let digit = digits % 10;
      *slot = ParameterMode::try_from(digit)
        .map_err(|_| MachineError::UnknownParameterMode { mode: digit, word, address })?;
      digits /= 10;
    }

    Ok(Instruction { operation, modes })
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.operation.operand_count() {
      0 => write!(f, "{}", self.operation),
      n => {
        let modes =
          self.modes[..n]
              .iter()
              .map(|mode| format!("{}", mode))
              .collect::<Vec<String>>()
              .join(", ");
        write!(f, "{}({})", self.operation, modes)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_opcode_defaults_to_position_modes() {
    let instruction = Instruction::decode(2, 0).unwrap();
    assert_eq!(instruction.operation, Operation::Multiply);
    assert_eq!(instruction.modes, [ParameterMode::Position; 3]);
  }

  #[test]
  fn mode_digits_decode_per_operand() {
    let instruction = Instruction::decode(1002, 0).unwrap();
    assert_eq!(instruction.operation, Operation::Multiply);
    assert_eq!(
      instruction.modes,
      [ParameterMode::Position, ParameterMode::Immediate, ParameterMode::Position]
    );
  }

  #[test]
  fn relative_mode_decodes() {
    let instruction = Instruction::decode(204, 0).unwrap();
    assert_eq!(instruction.operation, Operation::Output);
    assert_eq!(instruction.modes[0], ParameterMode::Relative);
  }

  #[test]
  fn halt_decodes() {
    let instruction = Instruction::decode(99, 12).unwrap();
    assert_eq!(instruction.operation, Operation::Halt);
  }

  #[test]
  fn unknown_opcode_is_an_error() {
    let result = Instruction::decode(98, 3);
    match result {
      Err(MachineError::UnknownOpcode { opcode: 98, address: 3 }) => {}
      other => panic!("expected unknown opcode, got {:?}", other),
    }
  }

  #[test]
  fn unknown_mode_digit_is_an_error() {
    // Opcode 2 is fine, but the first mode digit is 3.
    let result = Instruction::decode(302, 0);
    match result {
      Err(MachineError::UnknownParameterMode { mode: 3, word: 302, .. }) => {}
      other => panic!("expected unknown parameter mode, got {:?}", other),
    }
  }

  #[test]
  fn negative_word_is_an_unknown_opcode() {
    assert!(Instruction::decode(-1, 0).is_err());
  }

  #[test]
  fn strides_match_operand_counts() {
    assert_eq!(Operation::Add.stride(), 4);
    assert_eq!(Operation::JumpIfTrue.stride(), 3);
    assert_eq!(Operation::Input.stride(), 2);
    assert_eq!(Operation::AdjustBase.stride(), 2);
    assert_eq!(Operation::Halt.stride(), 1);
  }

  #[test]
  fn mnemonics_round_trip_to_text() {
    assert_eq!(Operation::JumpIfFalse.mnemonic(), "JumpIfFalse");
    assert_eq!(Operation::Halt.code(), 99);
  }
}
