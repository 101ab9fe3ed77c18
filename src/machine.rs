//! Structures and functions for the Intcode machine: the execution engine
//! that owns memory, the instruction pointer, and the relative base register,
//! and drives one program to completion or to a resumable suspension point.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};
use strum_macros::Display as StrumDisplay;

use crate::channel::Channel;
use crate::error::{InputError, MachineError};
use crate::instruction::{Instruction, Operation, ParameterMode};
use crate::memory::{Memory, Word};
use crate::program::Program;

/// Where the machine is in its lifecycle.
///
/// `AwaitingInput` is the one transient state: the INPUT instruction found a
/// buffered channel empty, the instruction pointer was not advanced, and the
/// same instruction re-executes on resume. `Halted` and `Fatal` are terminal.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ExecutionState {
  Running,
  AwaitingInput,
  Halted,
  Fatal,
}

pub struct Machine {
  // Memory store
  memory: Memory,

  // Registers //
  ip            : usize,          // Instruction Pointer, a cursor into memory
  relative_base : Word,           // Base register for Relative mode operands

  state   : ExecutionState,
  channel : Channel,

  // For tracing computations:
  #[cfg(feature = "trace_computation")] steps: usize,
}

impl Machine {

  // region Low-level utility methods

  /// Builds a machine over a fresh copy of the program, wired to the given
  /// channel. Starts `Running` with IP and relative base at zero.
  pub fn new(program: &Program, channel: Channel) -> Machine {
    Machine {
      memory        :  Memory::from_words(program.words()),
      ip            :  0,
      relative_base :  0,
      state         :  ExecutionState::Running,
      channel       :  channel,

      // Computation tracing:
      #[cfg(feature = "trace_computation")] steps: 0,
    }
  }

  pub fn state(&self) -> ExecutionState {
    self.state
  }

  pub fn ip(&self) -> usize {
    self.ip
  }

  pub fn relative_base(&self) -> Word {
    self.relative_base
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  /// Patches one memory cell before (or between) runs. This is how drivers
  /// install noun/verb style parameters without editing program text.
  pub fn poke(&mut self, address: usize, value: Word) {
    self.memory.write(address, value);
  }

  /// Reads one memory cell, growing memory if the address is fresh.
  pub fn peek(&mut self, address: usize) -> Word {
    self.memory.read(address)
  }

  /// Converts an operand-resolved word into a memory address. Negative
  /// addresses are a fatal contract violation, never clamped or wrapped.
  fn checked_address(&self, value: Word) -> Result<usize, MachineError> {
    if value < 0 {
      Err(MachineError::NegativeAddress { address: value, ip: self.ip })
    } else {
      Ok(value as usize)
    }
  }

  /// Records the fatal state and hands the error to the caller.
  fn fail(&mut self, error: MachineError) -> Result<ExecutionState, MachineError> {
    self.state = ExecutionState::Fatal;
    Err(error)
  }

  // endregion

  // region Operand resolution

  /**
    Materializes the value of operand `k` (1-based offset from the
    instruction pointer) under its addressing mode:

      Position:  memory[ memory[ip + k] ]
      Immediate: memory[ ip + k ]
      Relative:  memory[ base + memory[ip + k] ]
  */
  fn read_operand(&mut self, instruction: &Instruction, k: usize) -> Result<Word, MachineError> {
    let raw = self.memory.read(self.ip + k);
    match instruction.modes[k - 1] {

      ParameterMode::Position  => {
        let address = self.checked_address(raw)?;
        Ok(self.memory.read(address))
      }

      ParameterMode::Immediate => Ok(raw),

      ParameterMode::Relative  => {
        let address = self.checked_address(self.relative_base + raw)?;
        Ok(self.memory.read(address))
      }

    }
  }

  /**
    Materializes the destination address of operand `k`. Write targets exist
    only in Position and Relative modes; a program that encodes an Immediate
    write target is broken, and the machine refuses it rather than guessing.
  */
  fn write_target(&mut self, instruction: &Instruction, k: usize) -> Result<usize, MachineError> {
    let raw = self.memory.read(self.ip + k);
    match instruction.modes[k - 1] {
      ParameterMode::Position  => self.checked_address(raw),
      ParameterMode::Relative  => self.checked_address(self.relative_base + raw),
      ParameterMode::Immediate => Err(MachineError::ImmediateWriteTarget { ip: self.ip }),
    }
  }

  // endregion

  // region Execution

  /**
    Executes instructions until the machine leaves the `Running` state and
    returns the state it settled in: `Halted` on opcode 99, `AwaitingInput`
    when a buffered channel ran dry. Calling `run` again after supplying
    input resumes at the suspended INPUT instruction. A fatal error leaves
    the machine in `Fatal` and propagates.
  */
  pub fn run(&mut self) -> Result<ExecutionState, MachineError> {
    if self.state == ExecutionState::AwaitingInput {
      self.state = ExecutionState::Running;
    }
    while self.state == ExecutionState::Running {
      self.step()?;
    }
    Ok(self.state)
  }

  /**
    Decodes and executes the single instruction at the instruction pointer.
    On `Halted` or `Fatal` this is a no-op returning the terminal state; on
    `AwaitingInput` it re-attempts the same INPUT instruction.
  */
  pub fn step(&mut self) -> Result<ExecutionState, MachineError> {
    match self.state {
      ExecutionState::Halted | ExecutionState::Fatal => return Ok(self.state),
      ExecutionState::Running | ExecutionState::AwaitingInput => {}
    }

    let word = self.memory.read(self.ip);
    let instruction = match Instruction::decode(word, self.ip) {
      Ok(instruction) => instruction,
      Err(error) => return self.fail(error),
    };

    match self.execute(&instruction) {
      Ok(state) => {
        self.state = state;
        #[cfg(feature = "trace_computation")]
        {
          self.steps += 1;
          println!("[{}] {}\n{}", self.steps, instruction, self);
        }
        Ok(state)
      }
      Err(error) => self.fail(error),
    }
  }

  /// Dispatches one decoded instruction to its handler.
  fn execute(&mut self, instruction: &Instruction) -> Result<ExecutionState, MachineError> {
    match instruction.operation {
      Operation::Add         => self.op_arithmetic(instruction, |a, b| a + b),
      Operation::Multiply    => self.op_arithmetic(instruction, |a, b| a * b),
      Operation::Input       => self.op_input(instruction),
      Operation::Output      => self.op_output(instruction),
      Operation::JumpIfTrue  => self.op_jump(instruction, |a| a != 0),
      Operation::JumpIfFalse => self.op_jump(instruction, |a| a == 0),
      Operation::LessThan    => self.op_compare(instruction, |a, b| a < b),
      Operation::Equals      => self.op_compare(instruction, |a, b| a == b),
      Operation::AdjustBase  => self.op_adjust_base(instruction),
      Operation::Halt        => Ok(ExecutionState::Halted),
    }
  }

  fn op_arithmetic(
    &mut self,
    instruction: &Instruction,
    op: impl Fn(Word, Word) -> Word
  ) -> Result<ExecutionState, MachineError>
  {
    let a = self.read_operand(instruction, 1)?;
    let b = self.read_operand(instruction, 2)?;
    let target = self.write_target(instruction, 3)?;
    self.memory.write(target, op(a, b));
    self.ip += instruction.operation.stride();
    Ok(ExecutionState::Running)
  }

  fn op_compare(
    &mut self,
    instruction: &Instruction,
    test: impl Fn(Word, Word) -> bool
  ) -> Result<ExecutionState, MachineError>
  {
    let a = self.read_operand(instruction, 1)?;
    let b = self.read_operand(instruction, 2)?;
    let target = self.write_target(instruction, 3)?;
    self.memory.write(target, test(a, b) as Word);
    self.ip += instruction.operation.stride();
    Ok(ExecutionState::Running)
  }

  /**
    Stores one input word. When the channel has nothing to give, the machine
    suspends without touching the instruction pointer, so the read is retried
    from scratch on resume; the instruction has no visible effect until it
    succeeds, and then it succeeds exactly once.
  */
  fn op_input(&mut self, instruction: &Instruction) -> Result<ExecutionState, MachineError> {
    let target = self.write_target(instruction, 1)?;
    match self.channel.read_input() {
      Ok(value) => {
        self.memory.write(target, value);
        self.ip += instruction.operation.stride();
        Ok(ExecutionState::Running)
      }
      Err(InputError::Empty)        => Ok(ExecutionState::AwaitingInput),
      Err(InputError::Fault(fault)) => Err(MachineError::Device(fault)),
    }
  }

  fn op_output(&mut self, instruction: &Instruction) -> Result<ExecutionState, MachineError> {
    let value = self.read_operand(instruction, 1)?;
    self.channel.write_output(value)?;
    self.ip += instruction.operation.stride();
    Ok(ExecutionState::Running)
  }

  fn op_jump(
    &mut self,
    instruction: &Instruction,
    test: impl Fn(Word) -> bool
  ) -> Result<ExecutionState, MachineError>
  {
    let condition = self.read_operand(instruction, 1)?;
    let target = self.read_operand(instruction, 2)?;
    match test(condition) {
      true  => self.ip = self.checked_address(target)?,
      false => self.ip += instruction.operation.stride(),
    }
    Ok(ExecutionState::Running)
  }

  fn op_adjust_base(&mut self, instruction: &Instruction) -> Result<ExecutionState, MachineError> {
    let delta = self.read_operand(instruction, 1)?;
    self.relative_base += delta;
    self.ip += instruction.operation.stride();
    Ok(ExecutionState::Running)
  }

  // endregion

  // region Display methods

  fn make_memory_table(cells: &[Word], highlight: usize) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    // A window around the instruction pointer; whole-memory dumps get long
    // once a program has grown its store.
    let end = cells.len().min(highlight + 8);
    let start = highlight.saturating_sub(4).min(end);

    for (i, cell) in cells[start..end].iter().enumerate() {
      let address = start + i;
      match address == highlight {

        true  => {
          table.add_row(
            row![r->format!("* --> [{}] =", address), format!("{}", cell)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("[{}] =", address), format!("{}", cell)]
          );
        }

      } // end match on highlight
    } // end for
    table
  }

  // endregion

}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let memory_table = Machine::make_memory_table(self.memory.cells(), self.ip);

    let mut register_table = Table::new();
    register_table.set_format(*TABLE_DISPLAY_FORMAT);
    register_table.set_titles(row![ubr->"Register", ubl->"Value"]);
    register_table.add_row(row![r->"IP =", self.ip]);
    register_table.add_row(row![r->"BASE =", self.relative_base]);

    let mut combined_table = table!([memory_table, register_table]);

    combined_table.set_titles(row![ub->"Memory", ub->"Registers"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "State: {}\n{}", self.state, combined_table)
  }
}

/**
  One-shot buffered execution: runs the program against a private input queue
  seeded with `input` and returns every output it produced, in order. A
  program that asks for more input than was supplied is reported as
  `InputExhausted` rather than left suspended, since there is no one to
  resume it.
*/
pub fn run_with_input(program: &Program, input: &[Word]) -> Result<Vec<Word>, MachineError> {
  use crate::channel::shared_queue;
  use std::rc::Rc;

  let input_queue = shared_queue(input);
  let output_queue = shared_queue(&[]);
  let mut machine = Machine::new(
    program,
    Channel::buffered(input_queue, Rc::clone(&output_queue))
  );

  match machine.run()? {
    ExecutionState::Halted => {
      let outputs = output_queue.borrow_mut().drain(..).collect();
      Ok(outputs)
    }
    _ => Err(MachineError::InputExhausted { ip: machine.ip() }),
  }
}
