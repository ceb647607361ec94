//! Subscribe to the feature flags of a domain and print them as the poller refreshes them.
//!
//! Point `DOMAIN_PROFILES_API_URL` at a profile backend (defaults to production) and pass
//! the domain name as the first argument.

use std::time::Duration;

use domain_profile_flags::feature_flags::{
    FeatureFlagSettings, FeatureFlagSettingsUpdate, FeatureFlags,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let domain = std::env::args().nth(1);

    let mut settings = FeatureFlagSettings::from_env()?;
    // Poll quickly so a few refreshes show up while the demo runs.
    settings.apply(FeatureFlagSettingsUpdate {
        poll_interval_millis: Some(5_000),
        ..Default::default()
    })?;

    let flags = FeatureFlags::new(settings)?;
    let subscription = flags.use_feature_flags(true, domain.as_deref());

    println!("defaults: {:?}", subscription.current().variations);
    let resolved = subscription.resolved().await;
    println!("resolved: {:?}", resolved.variations);

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(6)).await;
        let snapshot = subscription.snapshot();
        println!(
            "fetches: {}, updated at: {:?}, chat enabled: {:?}",
            snapshot.fetch_count,
            snapshot.updated_at,
            subscription
                .current()
                .variations
                .get_bool("ecommerceServiceUsersEnableChat")
        );
    }

    Ok(())
}
