// [apps/gateway/src/bin/seed.rs]
//! Local-development seeder: creates one demo user with a business
//! profile so a freshly migrated database has something to exercise
//! the grants/applications routes against without a real signup flow.

use dotenvy::dotenv;
use tracing::{error, info};

use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
use grantwell_infra_db::repositories::profile::ProfileDraft;
use grantwell_infra_db::repositories::profile::ProfileRepository;
use grantwell_infra_db::repositories::user::UserRepository;
use grantwell_infra_db::GrantStoreClient;

const DEMO_SUBJECT: &str = "demo@grantwell.app";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info,grantwell_infra_db=debug").with_target(false).init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL is not set");
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    info!("connecting to grant store for seeding");
    let client = match GrantStoreClient::connect(&database_url, database_token).await {
        Ok(client) => client,
        Err(error) => {
            error!(%error, "seed failed to connect to the grant store");
            return Err(anyhow::anyhow!(error));
        }
    };

    let connection = client.connection()?;
    let users = UserRepository::new(connection);

    let user = match users.find_by_external_subject(DEMO_SUBJECT).await? {
        Some(user) => {
            info!(user_id = %user.id, "demo user already exists");
            user
        }
        None => {
            let user = users.create(DEMO_SUBJECT).await?;
            info!(user_id = %user.id, "created demo user");
            user
        }
    };

    let connection = client.connection()?;
    let profiles = ProfileRepository::new(connection);

    if profiles.find_by_user(user.id).await?.is_none() {
        let draft = ProfileDraft {
            narrative: "A five-person community health nonprofit providing free diabetes screening \
                        and nutrition counseling in rural clinics across three counties."
                .to_string(),
            sectors: vec!["health".to_string(), "community-services".to_string()],
            focus_areas: vec!["preventive-care".to_string(), "nutrition".to_string()],
            revenue_band: "under-500k".to_string(),
            team_size: 5,
            geographic_focus: vec!["rural".to_string()],
            strategic_goals: vec!["expand screening capacity".to_string()],
            resource_constraints: ResourceConstraints {
                max_project_duration_months: 18,
                max_reporting_complexity: ReportingComplexity::Standard,
                max_budget_management_capacity: 250_000.0,
            },
        };
        let profile = profiles.upsert(user.id, draft).await?;
        info!(profile_id = %profile.id, "created demo business profile");
    } else {
        info!("demo business profile already exists");
    }

    info!("seed complete");
    Ok(())
}
