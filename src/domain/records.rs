//! Typed records mirrored from the marketplace tables.
//!
//! Optional columns default to `None` so records decode both from full
//! Postgres rows (`row_to_json`, every column present) and from sparse rows.

use crate::domain::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Which marketplace vertical a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Shop,
    Food,
    Hire,
    Ride,
    Send,
}

impl ServiceType {
    pub const VALUES: &'static [&'static str] = &["shop", "food", "hire", "ride", "send"];
    /// Verticals a driver task can serve.
    pub const DRIVER_VALUES: &'static [&'static str] = &["ride", "send"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const VALUES: &'static [&'static str] = &[
        "pending",
        "accepted",
        "preparing",
        "in_transit",
        "delivered",
        "cancelled",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const VALUES: &'static [&'static str] =
        &["pending", "accepted", "in_progress", "completed", "cancelled"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const VALUES: &'static [&'static str] = &["open", "in_progress", "completed", "cancelled"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    SoldOut,
}

impl ProductStatus {
    pub const VALUES: &'static [&'static str] = &["active", "inactive", "sold_out"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodItemStatus {
    Available,
    Unavailable,
}

impl FoodItemStatus {
    pub const VALUES: &'static [&'static str] = &["available", "unavailable"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Active,
    Paused,
    Archived,
}

impl ServiceStatus {
    pub const VALUES: &'static [&'static str] = &["active", "paused", "archived"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl OfferStatus {
    pub const VALUES: &'static [&'static str] = &["pending", "accepted", "rejected", "completed"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(default)]
    pub driver_id: Option<Uuid>,
    pub service_type: ServiceType,
    #[serde(default)]
    pub items: Option<JsonValue>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub driver_id: Uuid,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub pickup_location: String,
    pub dropoff_location: String,
    #[serde(default)]
    pub fare: Option<f64>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub freelancer_id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preparation_minutes: Option<i32>,
    #[serde(default)]
    pub is_available: Option<bool>,
    pub status: FoodItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub freelancer_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub delivery_days: Option<i32>,
    pub status: ServiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffer {
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub freelancer_id: Uuid,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub proposed_price: Option<f64>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
