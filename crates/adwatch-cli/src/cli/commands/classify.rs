//! `adwatch classify <message>` – show how a failure message is classified.

use adwatch_core::error::{to_application_error, ErrorCategory};
use adwatch_core::retry::{classify_message, is_retryable_message};
use anyhow::Result;

pub fn run_classify(message: &str, category: ErrorCategory) -> Result<()> {
    let error = to_application_error(message, category);
    println!("category:  {}", error.category());
    println!("status:    {}", error.status_code());
    println!("code:      {}", error.code().unwrap_or("-"));
    println!("kind:      {:?}", classify_message(message));
    println!("retryable: {}", is_retryable_message(message));
    Ok(())
}
