use serde::Serialize;
use uuid::Uuid;

/// Directed edge: `user` follows `author`. At most one per ordered pair.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

impl Follow {
    /// `None` for a self-follow, which is never stored.
    pub fn new(user_id: Uuid, author_id: Uuid) -> Option<Self> {
        (user_id != author_id).then_some(Self { user_id, author_id })
    }
}
