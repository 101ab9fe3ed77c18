/*!

  A virtual machine for the Intcode instruction set: a memory-based
  interpreter over a growable array of signed 64 bit words, with three
  addressing modes, a relative base register, and pluggable input/output
  channels.

  A [`Program`] is parsed from comma-separated integer text and copied into a
  fresh [`Machine`], which executes until it halts or, when fed from an empty
  in-memory queue, suspends awaiting input. Suspended machines resume at the
  same instruction, which makes cooperative topologies trivial: wire one
  machine's output queue to another's input queue and round-robin `run` until
  every machine has halted. External collaborators attach through the
  [`Device`] trait and give the word stream whatever meaning they like.

*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod channel;
pub mod error;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod program;

pub use crate::channel::{shared_queue, Channel, Device, SharedQueue};
pub use crate::error::{DeviceFault, InputError, MachineError, ParseError};
pub use crate::instruction::{Instruction, Operation, ParameterMode};
pub use crate::machine::{run_with_input, ExecutionState, Machine};
pub use crate::memory::{Memory, Word};
pub use crate::program::Program;
