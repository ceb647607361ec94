//! Identifier casing helpers.

/// Converts a kebab-case identifier into camelCase.
///
/// Hyphens are removed and the first character of every segment after the first is
/// upper-cased. Identifiers without hyphens are returned unchanged.
///
/// # Examples
///
/// ```
/// use domain_profile_flags::util::kebab_to_camel;
///
/// assert_eq!(
///     kebab_to_camel("ecommerce-service-users-enable-chat"),
///     "ecommerceServiceUsersEnableChat"
/// );
/// assert_eq!(kebab_to_camel("enabled"), "enabled");
/// ```
pub fn kebab_to_camel(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for (index, segment) in input.split('-').enumerate() {
        if index == 0 {
            output.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            output.extend(first.to_uppercase());
            output.push_str(chars.as_str());
        }
    }
    output
}
