//! Command line driver: loads a program file and runs it against the
//! interactive channel. Inputs are prompted for on the terminal and outputs
//! are printed as they are produced.

use std::env;
use std::process;

use intcode::{Channel, Machine, Program};

fn main() {
  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let path = match env::args().nth(1) {
    Some(path) => path,
    None => {
      eprintln!("Usage: intcode <program-file>");
      process::exit(2);
    }
  };

  let program = match Program::load(&path) {
    Ok(program) => program,
    Err(error) => {
      eprintln!("{}: {}", path, error);
      process::exit(2);
    }
  };

  let mut machine = Machine::new(&program, Channel::interactive());
  if let Err(error) = machine.run() {
    eprintln!("fatal: {}", error);
    process::exit(1);
  }
}
