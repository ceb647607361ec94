#![doc = include_str!("README.md")]
mod api;
mod cache;
mod constants;
pub mod error;
mod flag_set;
pub mod keys;
pub mod settings;
pub mod value;

pub use api::{FeatureFlags, FeatureFlagsSubscription};
pub use cache::{QuerySnapshot, QueryState};
pub use constants::{API_BASE_URL_ENV, DEFAULT_API_BASE_URL};
pub use flag_set::{default_variations, CamelFlagSet, FeatureFlagsResult, FlagSet, MergeReport};
pub use keys::FlagKey;
pub use settings::{FeatureFlagSettings, FeatureFlagSettingsUpdate};
pub use value::{FlagKind, FlagValue};
