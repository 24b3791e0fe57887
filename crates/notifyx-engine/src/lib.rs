pub mod bulk;
pub mod executor;
pub mod sender;
pub mod template;

pub use executor::{ExecutionOutcome, execute_send_message};
pub use sender::{SendError, SendReceipt, TextSender};
