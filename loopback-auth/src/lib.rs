// Session tokens, bearer parsing and credentials for the simulator.

pub mod bearer;
pub mod error;
pub mod options;
pub mod password;
pub mod signer;
pub mod token;

pub use bearer::*;
pub use error::*;
pub use options::*;
pub use password::*;
pub use signer::*;
pub use token::*;
