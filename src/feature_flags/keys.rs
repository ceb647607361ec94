//! The closed set of flag keys and their defaults.
//!
//! Every key is declared once in the `flag_table!` invocation below together with its
//! wire name, kind and default, so a key without a default (or a default without a key)
//! does not compile.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::feature_flags::value::{FlagKind, FlagValue};
use crate::util::kebab_to_camel;

macro_rules! default_value {
    (Boolean, $value:tt) => {
        FlagValue::Boolean($value)
    };
    (Number, $value:tt) => {
        FlagValue::Number($value as f64)
    };
    (String, $value:tt) => {
        FlagValue::String(String::from($value))
    };
    (Json, $value:tt) => {
        FlagValue::Json(serde_json::json!($value))
    };
}

macro_rules! flag_table {
    ($( $variant:ident => $key:literal : $kind:ident = $default:tt ),* $(,)?) => {
        /// Identifier of a single feature flag.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FlagKey {
            $( $variant, )*
        }

        impl FlagKey {
            /// Every declared key, in declaration order.
            pub const ALL: &'static [FlagKey] = &[$( FlagKey::$variant, )*];

            /// The kebab-case name used by the default table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( FlagKey::$variant => $key, )*
                }
            }

            pub fn kind(self) -> FlagKind {
                match self {
                    $( FlagKey::$variant => FlagKind::$kind, )*
                }
            }

            pub fn default_value(self) -> FlagValue {
                match self {
                    $( FlagKey::$variant => default_value!($kind, $default), )*
                }
            }
        }
    };
}

flag_table! {
    EcommerceServiceUsersEnableChat => "ecommerce-service-users-enable-chat": Boolean = false,
    EcommerceServiceUsersEnableChatCommunity => "ecommerce-service-users-enable-chat-community": Boolean = false,
    EcommerceServiceUsersEnableChatCommunityMedia => "ecommerce-service-users-enable-chat-community-media": Boolean = false,
    EcommerceServiceUsersPublicProfileAddressVerifiedCheck => "ecommerce-service-users-public-profile-address-verified-check": Boolean = true,
    ProfileServiceEnableWalletCreation => "profile-service-enable-wallet-creation": Boolean = false,
    ProfileServiceEnableWalletSend => "profile-service-enable-wallet-send": Boolean = false,
    ProfileServiceEnableWalletSwap => "profile-service-enable-wallet-swap": Boolean = false,
    UdMeServiceDomainsEnableManagement => "ud-me-service-domains-enable-management": Boolean = false,
    ExampleNumber => "example-number": Number = 0,
    ProfileServiceWalletBalanceRefreshSeconds => "profile-service-wallet-balance-refresh-seconds": Number = 60,
    ExampleString => "example-string": String = "",
    UdMeServiceMaintenanceMessage => "ud-me-service-maintenance-message": String = "",
    ExampleJson => "example-json": Json = {},
    ProfileServiceFeaturedPartners => "profile-service-featured-partners": Json = [],
}

static WIRE_NAMES: LazyLock<HashMap<String, FlagKey>> = LazyLock::new(|| {
    let mut names = HashMap::with_capacity(FlagKey::ALL.len() * 2);
    for key in FlagKey::ALL {
        names.insert(key.as_str().to_string(), *key);
        names.insert(key.camel_name(), *key);
    }
    names
});

impl FlagKey {
    /// The camelCase name consumers and the backend use.
    pub fn camel_name(self) -> String {
        kebab_to_camel(self.as_str())
    }

    /// Resolves a wire name in either camelCase (canonical) or kebab-case.
    pub fn from_wire(name: &str) -> Option<FlagKey> {
        WIRE_NAMES.get(name).copied()
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
