use anyhow::Result;
use tracing::info;

use crate::common::{MemberId, ReviewTriggerId};
use crate::domains::peer_review::models::ReviewTrigger;
use crate::kernel::ServerDeps;

/// Create or replace a trigger configuration (administrators only).
pub async fn save_trigger(
    mut trigger: ReviewTrigger,
    updated_by: MemberId,
    deps: &ServerDeps,
) -> Result<ReviewTrigger> {
    trigger.updated_by = Some(updated_by);
    trigger.updated_at = chrono::Utc::now();
    let saved = deps.reviews.save_trigger(&trigger).await?;
    info!(trigger_id = %saved.id, kind = %saved.kind, active = saved.active, "Saved review trigger");
    Ok(saved)
}

pub async fn set_trigger_active(
    trigger_id: ReviewTriggerId,
    active: bool,
    updated_by: MemberId,
    deps: &ServerDeps,
) -> Result<ReviewTrigger> {
    let trigger = deps
        .reviews
        .set_trigger_active(trigger_id, active, updated_by)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Review trigger not found: {}", trigger_id))?;
    info!(trigger_id = %trigger_id, active = active, "Review trigger toggled");
    Ok(trigger)
}
