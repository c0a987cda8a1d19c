//! Request authentication for the exchange API

mod encrypt;
mod token;

pub use encrypt::PayloadEncryptor;
pub use token::TokenGenerator;
