use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied,
}

/// Telegram user ids permitted to post announcements. Fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    ids: HashSet<u64>,
}

impl AllowList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, caller_id: u64) -> bool {
        self.ids.contains(&caller_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

pub fn authorize(caller_id: u64, allow_list: &AllowList) -> Authorization {
    if allow_list.contains(caller_id) {
        Authorization::Allowed
    } else {
        Authorization::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_allowed() {
        let list = AllowList::new([7013293652, 42]);
        assert_eq!(authorize(42, &list), Authorization::Allowed);
        assert_eq!(authorize(7013293652, &list), Authorization::Allowed);
    }

    #[test]
    fn test_non_members_denied() {
        let list = AllowList::new([42]);
        assert_eq!(authorize(43, &list), Authorization::Denied);
        assert_eq!(authorize(0, &list), Authorization::Denied);
    }

    #[test]
    fn test_empty_list_denies_everyone() {
        let list = AllowList::default();
        assert_eq!(authorize(42, &list), Authorization::Denied);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(AllowList::new([1, 1, 2]).len(), 2);
    }
}
