pub const FEATURE_FLAGS_PATH: &str = "/feature-flags";
pub const DOMAIN_NAME_QUERY_PARAM: &str = "domainName";
pub const DEFAULT_API_BASE_URL: &str = "https://profile.unstoppabledomains.com";
pub const API_BASE_URL_ENV: &str = "DOMAIN_PROFILES_API_URL";
