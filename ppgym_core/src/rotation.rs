//! Position-based workout rotation.
//!
//! A program is a fixed, ordered list of template ids. The completed-workout
//! counter is the rotation position: the current template is
//! `order[counter % order.len()]`. The counter only advances when a session
//! is completed, never at midnight, so "today's workout" means "the workout
//! at the current position" rather than a calendar schedule.

/// Template id at the current rotation position
///
/// Returns `None` for an empty order (no program selected).
pub fn current_template_id<'a>(order: &[&'a str], counter: u32) -> Option<&'a str> {
    template_at(order, u64::from(counter))
}

/// Template id shown after the current one completes
pub fn next_template_id<'a>(order: &[&'a str], counter: u32) -> Option<&'a str> {
    template_at(order, u64::from(counter) + 1)
}

/// Template id for today given whether a session was already completed today
///
/// Once today's workout is done the rotation has effectively moved on, so the
/// next position is shown instead of the current one.
pub fn todays_template_id<'a>(
    order: &[&'a str],
    counter: u32,
    completed_today: bool,
) -> Option<&'a str> {
    if completed_today {
        next_template_id(order, counter)
    } else {
        current_template_id(order, counter)
    }
}

fn template_at<'a>(order: &[&'a str], position: u64) -> Option<&'a str> {
    if order.is_empty() {
        return None;
    }
    let index = (position % order.len() as u64) as usize;
    Some(order[index])
}
