mod generate;
mod settings;

pub use generate::*;
pub use settings::*;
