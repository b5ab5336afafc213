pub mod review_util;
pub mod reviewer;

pub use review_util::*;
pub use reviewer::*;
