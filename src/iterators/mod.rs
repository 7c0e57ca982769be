pub mod line;

pub use line::{LineSampler, LineSamples, LineStep};
