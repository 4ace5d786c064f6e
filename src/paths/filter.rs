use super::PathSet;

/// True unless every modified path is ignored.
///
/// An empty modified set is versionable: not knowing what changed must not
/// silently skip history.
pub fn is_versionable(modified: &PathSet, ignore: &PathSet) -> bool {
    if modified.is_empty() {
        return true;
    }
    !modified.is_subset(ignore)
}
