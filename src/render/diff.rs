use crate::ax::AccessibilityNode;

/// Decide whether `next` needs a rebuild compared with the last rendered snapshot.
///
/// Field-wise structural equality over the whole tree: role, name, ids,
/// handles, every attribute, and children in order.
pub fn snapshot_changed(previous: Option<&AccessibilityNode>, next: &AccessibilityNode) -> bool {
    previous != Some(next)
}
