//! Address list handling: parsing `address,amount` rows into typed requests
//! and regenerating the amount column with random values.

pub mod amounts;
pub mod parser;

pub use amounts::randomize_amounts;
pub use parser::{parse, LineError, WithdrawalRequest};
