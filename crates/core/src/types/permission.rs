//! Permission codenames.
//!
//! Groups hold sets of codenames; a user's permissions are the union over
//! their groups. Superusers implicitly hold every permission.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named capability checked before a back office page is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewProduct,
    AddProduct,
    ChangeProduct,
    DeleteProduct,
    UpdateStock,
    ViewCategory,
    AddCategory,
    ChangeCategory,
    DeleteCategory,
    ViewSupplier,
    AddSupplier,
    ChangeSupplier,
    DeleteSupplier,
    ViewUser,
    AddUser,
    ChangeUser,
    DeleteUser,
}

/// Unknown permission codename.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission codename: {0}")]
pub struct PermissionParseError(pub String);

impl Permission {
    /// Every permission, in display order.
    pub const ALL: [Self; 17] = [
        Self::ViewProduct,
        Self::AddProduct,
        Self::ChangeProduct,
        Self::DeleteProduct,
        Self::UpdateStock,
        Self::ViewCategory,
        Self::AddCategory,
        Self::ChangeCategory,
        Self::DeleteCategory,
        Self::ViewSupplier,
        Self::AddSupplier,
        Self::ChangeSupplier,
        Self::DeleteSupplier,
        Self::ViewUser,
        Self::AddUser,
        Self::ChangeUser,
        Self::DeleteUser,
    ];

    /// The codename stored in `group_permission.codename`.
    #[must_use]
    pub const fn codename(self) -> &'static str {
        match self {
            Self::ViewProduct => "view_product",
            Self::AddProduct => "add_product",
            Self::ChangeProduct => "change_product",
            Self::DeleteProduct => "delete_product",
            Self::UpdateStock => "update_stock",
            Self::ViewCategory => "view_category",
            Self::AddCategory => "add_category",
            Self::ChangeCategory => "change_category",
            Self::DeleteCategory => "delete_category",
            Self::ViewSupplier => "view_supplier",
            Self::AddSupplier => "add_supplier",
            Self::ChangeSupplier => "change_supplier",
            Self::DeleteSupplier => "delete_supplier",
            Self::ViewUser => "view_user",
            Self::AddUser => "add_user",
            Self::ChangeUser => "change_user",
            Self::DeleteUser => "delete_user",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.codename() == s)
            .ok_or_else(|| PermissionParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_codenames_roundtrip_through_from_str() {
        for perm in Permission::ALL {
            assert_eq!(perm.codename().parse::<Permission>().unwrap(), perm);
        }
    }

    #[test]
    fn test_codenames_are_unique() {
        let names: HashSet<_> = Permission::ALL.iter().map(|p| p.codename()).collect();
        assert_eq!(names.len(), Permission::ALL.len());
    }

    #[test]
    fn test_unknown_codename() {
        let err = "launch_rockets".parse::<Permission>().unwrap_err();
        assert_eq!(err.to_string(), "unknown permission codename: launch_rockets");
    }

    #[test]
    fn test_serde_uses_codename() {
        let json = serde_json::to_string(&Permission::UpdateStock).unwrap();
        assert_eq!(json, "\"update_stock\"");
    }
}
