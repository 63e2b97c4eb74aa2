pub mod grouped_linear;

pub use grouped_linear::{GroupedLinear, GroupedLinearConfig};
