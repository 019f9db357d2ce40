mod money;

pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;

mod helpers;
pub use helpers::parse_boolean_flag;
