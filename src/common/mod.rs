pub mod aggregate;
pub mod context;
pub mod encoder;
pub mod error;
pub mod matrix;
pub mod options;
pub(crate) mod util;
