pub mod case;

pub use case::kebab_to_camel;
