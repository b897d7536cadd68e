//! Merchandise service implementation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::UploadsConfig;
use crate::database::{DatabaseService, FieldUpdate, FieldUpdates};
use crate::models::MerchandiseCategory;
use crate::services::images::ImagePolicy;
use crate::services::notification::NotificationService;
use crate::utils::errors::{Result, ValidationErrors};
use crate::utils::logging::log_admin_action;

/// Editable merchandise fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseUpdate {
    pub name: String,
    pub description: String,
    pub diamonds_to_redeem: u32,
    pub category: MerchandiseCategory,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub collection_location_name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MerchandiseService {
    db: DatabaseService,
    notifications: NotificationService,
    images: ImagePolicy,
}

impl MerchandiseService {
    pub fn new(db: DatabaseService, notifications: NotificationService, uploads: &UploadsConfig) -> Self {
        Self {
            db,
            notifications,
            images: ImagePolicy::merchandise_images(uploads),
        }
    }

    pub fn validate(&self, update: &MerchandiseUpdate) -> Result<()> {
        let mut errors = ValidationErrors::new();

        if update.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        if update.diamonds_to_redeem == 0 {
            errors.add("diamondsToRedeem", "Diamonds to redeem must be greater than 0");
        }
        if update.collection_location_name.trim().is_empty() {
            errors.add("collectionLocationName", "Collection location is required");
        }
        if update.category == MerchandiseCategory::Clothing
            && update.sizes.iter().all(|size| size.trim().is_empty())
        {
            errors.add("sizes", "Select at least one size for clothing");
        }
        self.images.check("images", &update.images, &mut errors);

        errors.into_result()
    }

    /// Field updates for a validated form; non-clothing drops `sizes`
    fn field_updates(update: &MerchandiseUpdate) -> FieldUpdates {
        let sizes = match update.category {
            MerchandiseCategory::Clothing => {
                let sizes: Vec<Value> = update
                    .sizes
                    .iter()
                    .map(|size| size.trim())
                    .filter(|size| !size.is_empty())
                    .map(Value::from)
                    .collect();
                FieldUpdate::Set(Value::Array(sizes))
            }
            MerchandiseCategory::NonClothing => FieldUpdate::Delete,
        };

        vec![
            ("name".to_string(), FieldUpdate::Set(Value::from(update.name.trim()))),
            ("description".to_string(), FieldUpdate::Set(Value::from(update.description.as_str()))),
            ("diamondsToRedeem".to_string(), FieldUpdate::Set(Value::from(update.diamonds_to_redeem))),
            (
                "category".to_string(),
                FieldUpdate::Set(serde_json::to_value(update.category).unwrap_or(Value::Null)),
            ),
            ("sizes".to_string(), sizes),
            (
                "collectionLocationName".to_string(),
                FieldUpdate::Set(Value::from(update.collection_location_name.trim())),
            ),
            (
                "images".to_string(),
                FieldUpdate::Set(Value::Array(update.images.iter().cloned().map(Value::from).collect())),
            ),
        ]
    }

    pub async fn update_merchandise(&self, merchandise_id: &str, update: &MerchandiseUpdate) -> Result<()> {
        self.validate(update)?;

        let result = async {
            self.db.merchandise.get(merchandise_id).await?;
            self.db
                .merchandise
                .update_fields(merchandise_id, Self::field_updates(update))
                .await
        }
        .await;

        if result.is_ok() {
            log_admin_action("update_merchandise", merchandise_id, None);
        }
        self.notifications.report(result, |_| "Merchandise updated.".to_string())
    }

    /// Show or hide an item in the student app
    pub async fn set_availability(&self, merchandise_id: &str, available: bool) -> Result<()> {
        let result = async {
            self.db.merchandise.get(merchandise_id).await?;
            self.db
                .merchandise
                .update_fields(
                    merchandise_id,
                    vec![("available".to_string(), FieldUpdate::Set(Value::Bool(available)))],
                )
                .await
        }
        .await;

        if result.is_ok() {
            log_admin_action("set_availability", merchandise_id, Some(if available { "available" } else { "unavailable" }));
        }
        self.notifications.report(result, |_| {
            if available {
                "Merchandise is now available.".to_string()
            } else {
                "Merchandise is now unavailable.".to_string()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(category: MerchandiseCategory, sizes: &[&str]) -> MerchandiseUpdate {
        MerchandiseUpdate {
            name: "Hoodie".to_string(),
            description: String::new(),
            diamonds_to_redeem: 120,
            category,
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            collection_location_name: "Student Centre".to_string(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_non_clothing_deletes_sizes() {
        let updates = MerchandiseService::field_updates(&update(MerchandiseCategory::NonClothing, &["M"]));
        let sizes = updates.iter().find(|(key, _)| key == "sizes").map(|(_, u)| u.clone());
        assert_eq!(sizes, Some(FieldUpdate::Delete));
    }

    #[test]
    fn test_clothing_keeps_trimmed_sizes() {
        let updates = MerchandiseService::field_updates(&update(MerchandiseCategory::Clothing, &[" S ", "", "L"]));
        let sizes = updates.iter().find(|(key, _)| key == "sizes").map(|(_, u)| u.clone());
        assert_eq!(sizes, Some(FieldUpdate::Set(serde_json::json!(["S", "L"]))));
    }
}
