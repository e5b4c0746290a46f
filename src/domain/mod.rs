mod account;
mod money;
mod records;
mod transfer;

pub use account::*;
pub use money::*;
pub use records::*;
pub use transfer::*;
