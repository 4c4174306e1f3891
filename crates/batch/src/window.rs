//! Fetch-window arithmetic for the paging strategy.

/// Computes the LIMIT to request for the next paged fetch.
///
/// Without a declared limit every window is `batch_size`. With one, the
/// window shrinks so the cap is honored:
///
/// - past the cap (`offset > limit`), nothing is requested;
/// - exactly at the cap (`offset == limit`), one more row is requested,
///   since OFFSET skips rows exclusively and the boundary row is next;
/// - when a full batch would overshoot, the window is the remainder.
///
/// A declared limit of zero never requests anything: the query is
/// explicitly capped at zero rows.
pub(crate) fn window_size(
    batch_size: usize,
    offset: usize,
    declared_limit: Option<usize>,
) -> usize {
    let limit = match declared_limit {
        Some(limit) => limit,
        None => return batch_size,
    };

    if limit == 0 || offset > limit {
        0
    } else if offset == limit {
        1
    } else if batch_size + offset >= limit {
        limit - offset
    } else {
        batch_size
    }
}
