//! Merchandise and redemption models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub diamonds_to_redeem: u32,
    pub category: MerchandiseCategory,
    /// Present only for clothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    pub collection_location_name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MerchandiseCategory {
    Clothing,
    #[serde(rename = "Non-Clothing")]
    NonClothing,
}

/// A student's claim on a merchandise item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "merchandiseID")]
    pub merchandise_id: String,
    #[serde(rename = "studentID")]
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub collected: bool,
}
