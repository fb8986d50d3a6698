//! Custom request extractors.

mod fields;

pub use fields::Fields;
