//! Command handlers

mod pass_rates;
mod validate;

pub use pass_rates::handle_pass_rates;
pub use validate::handle_validate;
