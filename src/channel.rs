//! The machine's input/output seam.
//!
//! A `Channel` answers exactly two requests: produce the next input word and
//! accept one output word. Three interchangeable strategies exist. The
//! interactive channel blocks on a terminal prompt, the buffered channel pops
//! and pushes FIFO queues that may be shared with a sibling machine, and the
//! device channel delegates both requests to an external [`Device`]. All
//! puzzle-specific collaborators (renderers, robot controllers, and the like)
//! attach through `Device`; the machine itself never learns what the words
//! mean.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write as IoWrite};
use std::rc::Rc;

use crate::error::{DeviceFault, InputError};
use crate::memory::Word;

/**
  A FIFO of words that can be shared between a producing and a consuming
  machine. One machine's output queue is the other's input queue; the driver
  that created the queue keeps its own handle to seed and drain it. Sharing is
  `Rc`-based because the whole topology is driven by one thread, one machine
  at a time.
*/
pub type SharedQueue = Rc<RefCell<VecDeque<Word>>>;

/// Creates a queue pre-loaded with the given words.
pub fn shared_queue(values: &[Word]) -> SharedQueue {
  Rc::new(RefCell::new(values.iter().copied().collect()))
}

/// An external collaborator wired to the machine's I/O.
///
/// `provide_input` may return [`InputError::Empty`] to signal that no value
/// is available yet; the machine suspends and the same request is repeated on
/// resume. Any [`DeviceFault`] is propagated to the driver unchanged.
pub trait Device {
  fn provide_input(&mut self) -> Result<Word, InputError>;
  fn accept_output(&mut self, value: Word) -> Result<(), DeviceFault>;
}

/// One of the three I/O strategies. Constructed once and owned by a machine
/// for its lifetime.
pub enum Channel {
  /// Prompts on stdout and reads words from stdin. Never reports `Empty`.
  Interactive,
  /// Pops from and pushes to in-memory queues, possibly shared.
  Buffered { input: SharedQueue, output: SharedQueue },
  /// Delegates both operations to an external device.
  Device(Box<dyn Device>),
}

impl Channel {
  pub fn interactive() -> Channel {
    Channel::Interactive
  }

  pub fn buffered(input: SharedQueue, output: SharedQueue) -> Channel {
    Channel::Buffered { input, output }
  }

  pub fn device<D: Device + 'static>(device: D) -> Channel {
    Channel::Device(Box::new(device))
  }

  /// Produces the next input word, or `Empty` when a buffered queue has
  /// nothing to pop.
  pub fn read_input(&mut self) -> Result<Word, InputError> {
    match self {
      Channel::Interactive            => prompt_for_word(),
      Channel::Buffered { input, .. } => {
        input
          .borrow_mut()
          .pop_front()
          .ok_or(InputError::Empty)
      }
      Channel::Device(device)         => device.provide_input(),
    }
  }

  /// Hands one output word to the channel. Queue order is the order of
  /// production; a FIFO never reorders.
  pub fn write_output(&mut self, value: Word) -> Result<(), DeviceFault> {
    match self {
      Channel::Interactive             => {
        println!("{}", value);
        Ok(())
      }
      Channel::Buffered { output, .. } => {
        output.borrow_mut().push_back(value);
        Ok(())
      }
      Channel::Device(device)          => device.accept_output(value),
    }
  }
}

/// Blocking terminal read. Re-prompts until a line parses as a word; a closed
/// or failing stdin is a device fault, since a blocking channel has no way to
/// say "try again later".
fn prompt_for_word() -> Result<Word, InputError> {
  let stdin = io::stdin();
  let mut line = String::new();

  loop {
    print!("INPUT: ");
    io::stdout()
      .flush()
      .map_err(|e| DeviceFault::new(format!("cannot flush stdout: {}", e)))?;

    line.clear();
    let bytes_read = stdin
      .lock()
      .read_line(&mut line)
      .map_err(|e| DeviceFault::new(format!("cannot read stdin: {}", e)))?;
    if bytes_read == 0 {
      return Err(InputError::Fault(
        DeviceFault::new("standard input closed before a value was provided")
      ));
    }

    match line.trim().parse::<Word>() {
      Ok(value) => return Ok(value),
      Err(_)    => println!("Not an integer: {}", line.trim()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffered_pops_in_fifo_order() {
    let input = shared_queue(&[1, 2, 3]);
    let output = shared_queue(&[]);
    let mut channel = Channel::buffered(input, output);
    assert_eq!(channel.read_input().unwrap(), 1);
    assert_eq!(channel.read_input().unwrap(), 2);
    assert_eq!(channel.read_input().unwrap(), 3);
  }

  #[test]
  fn buffered_reports_empty() {
    let mut channel = Channel::buffered(shared_queue(&[]), shared_queue(&[]));
    match channel.read_input() {
      Err(InputError::Empty) => {}
      other => panic!("expected Empty, got {:?}", other),
    }
  }

  #[test]
  fn buffered_preserves_output_order() {
    let output = shared_queue(&[]);
    let mut channel = Channel::buffered(shared_queue(&[]), Rc::clone(&output));
    channel.write_output(10).unwrap();
    channel.write_output(20).unwrap();
    let drained: Vec<Word> = output.borrow_mut().drain(..).collect();
    assert_eq!(drained, vec![10, 20]);
  }

  #[test]
  fn one_queue_chains_two_channels() {
    // The producer's output queue is the consumer's input queue.
    let pipe = shared_queue(&[]);
    let mut producer = Channel::buffered(shared_queue(&[]), Rc::clone(&pipe));
    let mut consumer = Channel::buffered(Rc::clone(&pipe), shared_queue(&[]));

    producer.write_output(7).unwrap();
    assert_eq!(consumer.read_input().unwrap(), 7);
  }

  struct ScriptedDevice {
    script: VecDeque<Word>,
    seen: Rc<RefCell<Vec<Word>>>,
  }

  impl Device for ScriptedDevice {
    fn provide_input(&mut self) -> Result<Word, InputError> {
      self.script.pop_front().ok_or(InputError::Empty)
    }

    fn accept_output(&mut self, value: Word) -> Result<(), DeviceFault> {
      self.seen.borrow_mut().push(value);
      Ok(())
    }
  }

  #[test]
  fn device_channel_delegates_both_directions() {
    let seen = Rc::new(RefCell::new(vec![]));
    let device = ScriptedDevice {
      script: vec![5].into_iter().collect(),
      seen: Rc::clone(&seen),
    };
    let mut channel = Channel::device(device);

    assert_eq!(channel.read_input().unwrap(), 5);
    match channel.read_input() {
      Err(InputError::Empty) => {}
      other => panic!("expected Empty, got {:?}", other),
    }

    channel.write_output(11).unwrap();
    assert_eq!(*seen.borrow(), vec![11]);
  }
}
