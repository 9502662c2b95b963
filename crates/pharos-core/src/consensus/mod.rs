pub mod churn;
pub mod epoch;

pub use churn::*;
pub use epoch::*;
