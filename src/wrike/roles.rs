//! Role labels derived from contact profiles.

use serde::Serialize;

use crate::wrike::models::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub display_name: &'static str,
    /// CSS badge class used by front ends.
    pub role_class: &'static str,
    pub priority: u8,
    pub is_external: bool,
    pub is_admin: bool,
    pub is_owner: bool,
}

pub const OWNER: RoleInfo = RoleInfo {
    display_name: "Owner",
    role_class: "bg-danger",
    priority: 5,
    is_external: false,
    is_admin: true,
    is_owner: true,
};

pub const ADMINISTRATOR: RoleInfo = RoleInfo {
    display_name: "Administrator",
    role_class: "bg-warning",
    priority: 4,
    is_external: false,
    is_admin: true,
    is_owner: false,
};

pub const EXTERNAL_USER: RoleInfo = RoleInfo {
    display_name: "External user",
    role_class: "bg-secondary",
    priority: 3,
    is_external: true,
    is_admin: false,
    is_owner: false,
};

pub const REGULAR_USER: RoleInfo = RoleInfo {
    display_name: "Regular user",
    role_class: "bg-primary",
    priority: 2,
    is_external: false,
    is_admin: false,
    is_owner: false,
};

pub const COLLABORATOR: RoleInfo = RoleInfo {
    display_name: "Collaborator",
    role_class: "bg-success",
    priority: 1,
    is_external: false,
    is_admin: false,
    is_owner: false,
};

pub fn role_of(profile: &Profile) -> RoleInfo {
    if profile.owner {
        return OWNER;
    }
    if profile.admin {
        return ADMINISTRATOR;
    }
    if profile.external {
        return EXTERNAL_USER;
    }
    match profile.role.to_lowercase().as_str() {
        "collaborator" | "collab" => COLLABORATOR,
        _ => REGULAR_USER,
    }
}

/// Highest-priority role over all profiles; the first one wins a tie.
pub fn primary_role(profiles: &[Profile]) -> RoleInfo {
    profiles
        .iter()
        .map(role_of)
        .fold(None::<RoleInfo>, |best, role| match best {
            Some(best) if best.priority >= role.priority => Some(best),
            _ => Some(role),
        })
        .unwrap_or(REGULAR_USER)
}

pub fn all_roles(profiles: &[Profile]) -> Vec<RoleInfo> {
    profiles.iter().map(role_of).collect()
}

/// Bucket used by user statistics.
pub fn category(role: &RoleInfo) -> &'static str {
    if role.is_owner {
        "owner"
    } else if role.is_admin {
        "admin"
    } else if role.is_external {
        "external"
    } else if role.display_name == COLLABORATOR.display_name {
        "collaborator"
    } else {
        "regular"
    }
}

pub fn japanese_name(role: &RoleInfo) -> &'static str {
    match role.display_name {
        "Owner" => "オーナー",
        "Administrator" => "管理者",
        "External user" => "外部ユーザー",
        "Regular user" => "正規ユーザー",
        "Collaborator" => "コラボレーター",
        other => other,
    }
}

/// Display name for a locale; anything but `ja` falls back to English.
pub fn localized_name(role: &RoleInfo, lang: &str) -> &'static str {
    if lang.eq_ignore_ascii_case("ja") {
        japanese_name(role)
    } else {
        role.display_name
    }
}
