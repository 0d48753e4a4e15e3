//! Client side of copilot-relay.
//!
//! - Delivers messages to the listener over HTTP
//! - Runs the interactive line loop
//! - Renders the project task form
//! - Prints delivery outcomes for the user

pub mod form;
pub mod http;
pub mod repl;

pub use http::DeliveryClient;

use crate::error::DeliveryError;
use crate::protocol::{MessageResponse, Reply};
use std::io::{self, Write};

/// Print the outcome of a delivery and report whether it succeeded.
pub fn report_outcome<W: Write>(
    outcome: &Result<MessageResponse, DeliveryError>,
    out: &mut W,
) -> io::Result<bool> {
    match outcome {
        Ok(response) => {
            writeln!(out, "Response status: {}", response.status)?;
            writeln!(out, "Original message: {}", response.message)?;
            match response.reply() {
                Some(Reply::Copilot(reply)) => writeln!(out, "Copilot reply: {}", reply)?,
                Some(Reply::Result(result)) => writeln!(out, "Processing result: {}", result)?,
                None => writeln!(out, "Processing result: (none)")?,
            }
            if let Some(instructions) = &response.instructions {
                writeln!(out, "{}", instructions)?;
            }
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Delivery failed ({}): {}", e.kind(), e)?;
            Ok(false)
        }
    }
}
