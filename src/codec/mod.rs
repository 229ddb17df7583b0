// Image codec abstraction - pluggable encoders behind a single quality dial.

pub mod jpeg;
pub mod traits;
