//! Resource key definitions.
//!
//! A [`ResourceKey`] names one logical remote-backed value the query cache
//! tracks. Keys are stable for the lifetime of a session.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// The watch catalog.
    Watches,
    /// All order records.
    Orders,
    /// The full message and reply tree.
    Messages,
    /// Whether the caller is an admin.
    IsAdmin,
    /// The caller's saved profile.
    CallerProfile,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 5] = [
        ResourceKey::Watches,
        ResourceKey::Orders,
        ResourceKey::Messages,
        ResourceKey::IsAdmin,
        ResourceKey::CallerProfile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKey::Watches => "watches",
            ResourceKey::Orders => "orders",
            ResourceKey::Messages => "messages",
            ResourceKey::IsAdmin => "is_admin",
            ResourceKey::CallerProfile => "caller_profile",
        }
    }
}
