//! Dense sibling ordering.
//!
//! # Invariants
//! - After `densify`, `order` equals the vector position for every sibling.
//! - Only siblings whose `order` actually changes are cloned.

use crate::model::node::{Project, Subtask, Task};
use std::sync::Arc;

/// Node kinds that carry a sibling position.
pub trait Ordered: Clone {
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

macro_rules! impl_ordered {
    ($($node:ty),*) => {
        $(impl Ordered for $node {
            fn order(&self) -> usize {
                self.order
            }

            fn set_order(&mut self, order: usize) {
                self.order = order;
            }
        })*
    };
}

impl_ordered!(Project, Task, Subtask);

/// Rewrites `order` to `0..n-1` following vector position.
pub fn densify<T: Ordered>(siblings: &mut [Arc<T>]) {
    for (index, sibling) in siblings.iter_mut().enumerate() {
        if sibling.order() != index {
            Arc::make_mut(sibling).set_order(index);
        }
    }
}

/// Moves the element at `from` so it lands at `to` in the resulting list.
///
/// `to` is a post-removal position. Returns `false` (and leaves the list
/// untouched) when either index is out of range.
pub fn move_within<T: Ordered>(siblings: &mut Vec<Arc<T>>, from: usize, to: usize) -> bool {
    let len = siblings.len();
    if from >= len || to >= len {
        return false;
    }
    if from != to {
        let moved = siblings.remove(from);
        siblings.insert(to, moved);
    }
    densify(siblings);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtasks(count: usize) -> Vec<Arc<Subtask>> {
        (0..count).map(|index| Arc::new(Subtask::new(index))).collect()
    }

    fn ids(list: &[Arc<Subtask>]) -> Vec<uuid::Uuid> {
        list.iter().map(|item| item.id).collect()
    }

    #[test]
    fn move_uses_post_removal_target() {
        let mut list = subtasks(4);
        let original = ids(&list);

        assert!(move_within(&mut list, 0, 2));
        assert_eq!(
            ids(&list),
            vec![original[1], original[2], original[0], original[3]]
        );
        assert_eq!(
            list.iter().map(|item| item.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn move_and_move_back_restores_order() {
        let mut list = subtasks(5);
        let original = ids(&list);

        assert!(move_within(&mut list, 2, 0));
        assert!(move_within(&mut list, 0, 2));
        assert_eq!(ids(&list), original);
    }

    #[test]
    fn move_rejects_out_of_range() {
        let mut list = subtasks(3);
        let original = ids(&list);
        assert!(!move_within(&mut list, 3, 0));
        assert!(!move_within(&mut list, 0, 3));
        assert_eq!(ids(&list), original);
    }

    #[test]
    fn densify_only_touches_changed_siblings() {
        let mut list = subtasks(3);
        list.remove(0);
        let untouched_before = Arc::clone(&list[0]);
        densify(&mut list);
        assert_eq!(list[0].order, 0);
        assert_eq!(list[1].order, 1);
        assert!(!Arc::ptr_eq(&untouched_before, &list[0]));

        let stable = Arc::clone(&list[1]);
        densify(&mut list);
        assert!(Arc::ptr_eq(&stable, &list[1]));
    }
}
