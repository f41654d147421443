//! Seed permission groups from YAML.
//!
//! The file maps group names to permission codenames:
//!
//! ```yaml
//! Clerks:
//!   - view_product
//!   - change_product
//! ```
//!
//! Existing groups have their permission set replaced.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use stockroom_backoffice::db::GroupRepository;
use stockroom_core::Permission;

/// Group name to permission codenames.
pub type GroupsConfig = BTreeMap<String, Vec<String>>;

/// Upsert every group in the file.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, names an unknown
/// permission, or a database write fails.
pub async fn groups(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading groups from file");

    let content = tokio::fs::read_to_string(path).await?;
    let config: GroupsConfig = serde_yaml::from_str(&content)?;

    let groups = match resolve(&config) {
        Ok(groups) => groups,
        Err(errors) => {
            error!("Configuration validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    let pool = super::connect().await?;
    let repo = GroupRepository::new(&pool);

    for (name, permissions) in &groups {
        let group = repo.upsert_with_permissions(name, permissions).await?;
        info!(group_id = %group.id, name = %group.name, permissions = permissions.len(), "Group seeded");
    }

    info!(groups = groups.len(), "Seeding complete");
    Ok(())
}

/// Parse every codename, collecting all problems instead of stopping at the
/// first.
fn resolve(config: &GroupsConfig) -> Result<Vec<(String, Vec<Permission>)>, Vec<String>> {
    let mut errors = Vec::new();
    let mut groups = Vec::with_capacity(config.len());

    for (name, codenames) in config {
        if name.trim().is_empty() {
            errors.push("group name cannot be empty".to_string());
            continue;
        }

        let mut permissions = Vec::with_capacity(codenames.len());
        for codename in codenames {
            match codename.parse::<Permission>() {
                Ok(p) if !permissions.contains(&p) => permissions.push(p),
                Ok(_) => {}
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }
        groups.push((name.clone(), permissions));
    }

    if errors.is_empty() {
        Ok(groups)
    } else {
        Err(errors)
    }
}
