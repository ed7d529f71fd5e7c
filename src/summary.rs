//! Trip summary and coaching recommendation

use crate::types::{PenaltyCategory, SafetyScoreResult, TripSummary};

/// Coaching tip for the category that cost the most points
pub fn coaching_tip(category: PenaltyCategory) -> &'static str {
    match category {
        PenaltyCategory::HardBraking => {
            "Reduce hard braking by maintaining a safe following distance and anticipating stops."
        }
        PenaltyCategory::HardAcceleration => {
            "Apply throttle gently and accelerate smoothly for better safety scores."
        }
        PenaltyCategory::HarshCornering => "Slow down before turns and navigate corners smoothly.",
        PenaltyCategory::Speeding => "Respect speed limits with a small buffer for better scores.",
        PenaltyCategory::PhoneInteraction => "Keep your phone in Do Not Disturb mode while driving.",
    }
}

/// Category with the largest penalty; earlier categories win ties, so a
/// trip with no penalties falls back to hard braking.
pub fn primary_category(result: &SafetyScoreResult) -> PenaltyCategory {
    let breakdown = &result.score_breakdown;
    PenaltyCategory::ALL
        .iter()
        .copied()
        .fold(PenaltyCategory::HardBraking, |best, c| {
            if breakdown.get(c) > breakdown.get(best) {
                c
            } else {
                best
            }
        })
}

/// Render the fixed summary sentence and pick one recommendation
pub fn summarize(result: &SafetyScoreResult) -> TripSummary {
    let metrics = &result.trip_metrics;
    let events = &result.events;

    let summary = format!(
        "Trip summary: Score {}/10 • Distance {:.1} km • Duration {} min • Events HB {}, HA {}, HC {} • Speeding {}% • Phone use {} min.",
        result.total_score,
        metrics.distance_km,
        metrics.duration_minutes.round(),
        events.hard_brake_count,
        events.hard_accel_count,
        events.harsh_corner_count,
        events.speeding_percentage,
        events.phone_use_minutes,
    );

    let primary = primary_category(result);
    let tip = coaching_tip(primary);

    TripSummary {
        summary,
        primary_category: primary,
        recommendation: format!("Recommendation: {tip}"),
    }
}
