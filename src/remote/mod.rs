// Remote server access through the system OpenSSH tools.
//
// `command` builds argument vectors, `session` executes them.

pub mod command;
pub mod session;

pub use command::{Invocation, RemoteTarget};
pub use session::{check_tools, default_key_path, CommandOutput, KeySetup, Session, TEST_COMMAND};
