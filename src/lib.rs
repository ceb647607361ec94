#![doc = include_str!("RUSTDOC.md")]

pub mod feature_flags;
pub mod platform;
pub mod rest;
pub mod util;

#[cfg(test)]
pub mod test_support;
