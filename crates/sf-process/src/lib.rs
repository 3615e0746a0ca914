//! Ordered, named process trees.
//!
//! A [`ProcessNode`] is an ordered map from step name to either a callable,
//! a nested node, or a skipped placeholder. Running a node executes its
//! entries strictly in insertion order, recursing into nested nodes.
//!
//! Re-assigning an existing name replaces the entry in place, so a later
//! override of an inherited step runs exactly where the original did.
//!
//! ```
//! use sf_process::{ProcessError, ProcessNode};
//!
//! let mut process: ProcessNode<Vec<&'static str>, ProcessError> = ProcessNode::new();
//! process.set_step("iterate.conditions.a", |log| { log.push("a"); Ok(()) }).unwrap();
//! process.set_step("iterate.conditions.b", |log| { log.push("b"); Ok(()) }).unwrap();
//! process.set_step("iterate.conditions.a", |log| { log.push("a2"); Ok(()) }).unwrap();
//!
//! let mut log = Vec::new();
//! process.run_path("iterate", &mut log).unwrap();
//! assert_eq!(log, vec!["a2", "b"]);
//! ```

pub mod error;
pub mod node;

pub use error::{ProcessError, ProcessResult};
pub use node::{ProcessEntry, ProcessNode, Step};
