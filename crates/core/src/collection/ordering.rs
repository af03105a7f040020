//! Ordering policy for children ordered under a parent.
//!
//! `order` is a soft hint: it is never checked for collisions, and equal
//! values sort adjacently in insertion order.

/// Order for a new child: the explicit value when given (including `0`),
/// otherwise one past the highest sibling, or `0` with no siblings.
pub fn next_order<I>(sibling_orders: I, explicit: Option<i64>) -> i64
where
    I: IntoIterator<Item = i64>,
{
    if let Some(order) = explicit {
        return order;
    }
    sibling_orders
        .into_iter()
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Order for the element at `index` of a batch.
pub fn indexed_order(index: usize, explicit: Option<i64>) -> i64 {
    explicit.unwrap_or_else(|| i64::try_from(index).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_child_gets_zero() {
        assert_eq!(next_order(Vec::new(), None), 0);
    }

    #[test]
    fn next_child_follows_the_maximum() {
        assert_eq!(next_order([0], None), 1);
        assert_eq!(next_order([3, 9, 4], None), 10);
        assert_eq!(next_order([-5], None), -4);
    }

    #[test]
    fn explicit_order_passes_through_unchecked() {
        assert_eq!(next_order([7, 7, 8], Some(7)), 7);
        assert_eq!(next_order([1, 2], Some(0)), 0);
        assert_eq!(next_order(Vec::new(), Some(42)), 42);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        assert_eq!(next_order([i64::MAX], None), i64::MAX);
    }

    #[test]
    fn batch_elements_use_their_index() {
        assert_eq!(indexed_order(0, None), 0);
        assert_eq!(indexed_order(3, None), 3);
        assert_eq!(indexed_order(3, Some(10)), 10);
    }
}
