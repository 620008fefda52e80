use axum::Json;

use postdeck_types::api::PlanResponse;
use postdeck_types::models::SubscriptionTier;

/// GET /api/plans — subscription tiers and their monthly price.
pub async fn list_plans() -> Json<Vec<PlanResponse>> {
    let plans = SubscriptionTier::ALL
        .into_iter()
        .map(|tier| PlanResponse {
            id: tier,
            name: tier.plan_name().to_string(),
            description: tier.description().to_string(),
            monthly_price_cents: tier.monthly_price_cents(),
            currency: "usd".to_string(),
        })
        .collect();

    Json(plans)
}
