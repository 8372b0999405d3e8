//! Statistics over the sample window.
//!
//! All readers take the window by shared reference and never move either
//! cursor. Arithmetic is integer and truncating throughout.

use crate::config::{Band, RangeCfg};
use crate::reading::Reading;
use crate::util::MILLIS_PER_SEC;
use crate::window::SampleWindow;

/// Mean of the in-band samples, or a classification when fewer than half
/// of the slots are in band.
///
/// Missed slots count towards neither band. When the in-band count is below
/// `len / 2`, the out-of-band majority decides between `TooClose` and
/// `TooFar`; a tie (including an all-missed window) yields `NoData`.
pub fn mean_distance(window: &SampleWindow, range: &RangeCfg) -> Reading {
    let mut in_band: i64 = 0;
    let mut too_close: usize = 0;
    let mut too_far: usize = 0;
    let mut total: i64 = 0;

    for mm in window.slots().iter().filter_map(|s| s.echo()) {
        match range.classify(mm) {
            Band::TooClose => too_close += 1,
            Band::TooFar => too_far += 1,
            Band::InBand => {
                total += i64::from(mm);
                in_band += 1;
            }
        }
    }

    if in_band < (window.len() / 2) as i64 || in_band == 0 {
        return match too_close.cmp(&too_far) {
            std::cmp::Ordering::Greater => Reading::TooClose,
            std::cmp::Ordering::Less => Reading::TooFar,
            std::cmp::Ordering::Equal => Reading::NoData,
        };
    }
    // in-band values lie in [min_mm, max_mm), so the mean fits in i32
    Reading::Distance((total / in_band) as i32)
}

/// Mean squared deviation of every slot from `reference_mm`.
///
/// Missed slots contribute as 0 mm, so a window full of lost echoes reports
/// a large variance.
pub fn variance(window: &SampleWindow, reference_mm: i32) -> u64 {
    let sum = window.slots().iter().fold(0u64, |acc, s| {
        let d = i64::from(s.value_or_zero()) - i64::from(reference_mm);
        acc.saturating_add(d.unsigned_abs().saturating_mul(d.unsigned_abs()))
    });
    sum / window.len() as u64
}

/// Mean of the secant slopes (mm/s) between consecutive in-band samples in
/// poll order.
///
/// Out-of-band and missed slots are dropped before differencing, so a slope
/// can span several poll intervals. Pairs sharing the same poll timestamp
/// carry no time information and are skipped. Returns 0 when no slope can be
/// formed.
pub fn mean_velocity(window: &SampleWindow, range: &RangeCfg) -> i32 {
    let mut prev: Option<(i32, u64)> = None;
    let mut total: i64 = 0;
    let mut pairs: i64 = 0;

    for (slot, t_ms) in window.poll_order() {
        let Some(mm) = slot.echo().filter(|mm| range.contains(*mm)) else {
            continue;
        };
        if let Some((prev_mm, prev_ms)) = prev {
            // wrapping difference reinterpreted as signed survives counter wrap
            let dt = t_ms.wrapping_sub(prev_ms) as i64;
            if dt != 0 {
                let dd = i64::from(mm) - i64::from(prev_mm);
                total += MILLIS_PER_SEC * dd / dt;
                pairs += 1;
            }
        }
        prev = Some((mm, t_ms));
    }

    if pairs == 0 {
        return 0;
    }
    crate::util::saturate_i32(total / pairs)
}
