// Application bootstrap example for websettings
//
// Run with: cargo run --example bootstrap
// Try:      SITE_NAME="My DNS" RUST_LOG=debug cargo run --example bootstrap

use serde_json::json;
use websettings::{AppConfig, JsonStore, Setting, Settings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Declare every known setting with its kind and default
    let mut settings = Settings::builder()
        .with_store(JsonStore::new("./example_data/settings.json"))
        .register(Setting::string("site_name", "PowerDNS-Admin").label("Site name"))
        .register(Setting::bool("signup_enabled", true).label("Allow users to sign up"))
        .register(Setting::int("session_timeout", 10).label("Session timeout (minutes)"))
        .register(Setting::list("allowed_ips", vec![json!("0.0.0.0/0")]))
        .register(
            Setting::dict("oidc_oauth_claims", json!({}))
                .description("Claims mapped onto local user attributes"),
        )
        .build();

    println!("📦 websettings Bootstrap Example\n");

    // Environment and config files first, then saved values
    let mut app = AppConfig::new(".");
    let from_env = settings.load_environment(&mut app, None)?;
    let from_db = settings.load_database()?;
    println!("✅ Resolved {from_env} settings from the environment, {from_db} from the store\n");

    for name in settings.names() {
        if let Some(setting) = settings.get(name) {
            println!("  {}", setting.summary());
        }
    }

    // An admin edit, as a settings form would submit it
    println!("\n🔧 Setting session_timeout to \"30\"...");
    settings.set_value("session_timeout", json!("30"))?;
    if settings.save("session_timeout")? {
        println!("✅ Saved");
    } else {
        println!("⚠️  Not saved (set from the environment or the store failed)");
    }

    // Legacy values still load
    let claims = settings.convert_type("oidc_oauth_claims", json!("{'email': 'mail', 'admin': False}"))?;
    println!("\n📋 Legacy claims parsed as: {claims}");

    println!(
        "\n💾 Store location: {}",
        settings.store().path().display()
    );

    Ok(())
}
