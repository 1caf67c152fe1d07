use serde::Serialize;

use crate::models::TrendPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Rising,
    Flat,
    Falling,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Flat => "flat",
            TrendDirection::Falling => "falling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAssessment {
    /// 1..=10, 5 for a flat series.
    pub score: f64,
    pub direction: TrendDirection,
    pub recent_avg: f64,
    pub past_avg: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Compares the last three periods against the three before them.
///
/// Needs at least six points; shorter series are reported as unavailable.
pub fn assess_search_trend(points: &[TrendPoint]) -> Option<TrendAssessment> {
    if points.len() < 6 {
        return None;
    }
    let n = points.len();
    let recent_avg = mean(points[n - 3..].iter().map(|p| p.ratio))?;
    let past_avg = mean(points[n - 6..n - 3].iter().map(|p| p.ratio))?;

    let (direction, score) = if recent_avg > past_avg * 1.2 {
        (TrendDirection::Rising, 8.0)
    } else if recent_avg < past_avg * 0.8 {
        (TrendDirection::Falling, 3.0)
    } else {
        (TrendDirection::Flat, 5.0)
    };

    Some(TrendAssessment {
        score: f64::clamp(score, 1.0, 10.0),
        direction,
        recent_avg,
        past_avg,
    })
}

/// Market size on 1..=10 from the summed daily click share.
pub fn market_size_score(points: &[TrendPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let total: f64 = points.iter().map(|p| p.ratio).sum();
    Some((total / 10.0).clamp(1.0, 10.0))
}

pub fn mean_ratio(points: &[TrendPoint]) -> Option<f64> {
    mean(points.iter().map(|p| p.ratio))
}

/// Mean click count; periods without a count contribute zero.
pub fn mean_clicks(points: &[TrendPoint]) -> Option<f64> {
    mean(points.iter().map(|p| p.click_count.unwrap_or(0.0)))
}
