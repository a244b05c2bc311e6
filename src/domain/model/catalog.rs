//! The marketplace tables and the role-scoped resources built on them.

use super::registry::{Permissions, ResourceSpec, Scope};
use super::table::{Column, EnumField, TableModel};
use super::ColumnType::{Bool, Float, Int, Jsonb, Text, Timestamptz, Uuid};
use crate::domain::records::{
    FoodItemStatus, JobStatus, OfferStatus, OrderStatus, ProductStatus, ServiceStatus, ServiceType,
    TaskStatus,
};
use crate::domain::role::Role;

pub static ORDERS: TableModel = TableModel {
    table_name: "orders",
    columns: &[
        Column::new("id", Uuid),
        Column::new("customer_id", Uuid),
        Column::new("driver_id", Uuid),
        Column::new("service_type", Text),
        Column::new("items", Jsonb),
        Column::new("total_amount", Float),
        Column::new("delivery_address", Text),
        Column::new("notes", Text),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["customer_id", "service_type"],
    enumerated: &[
        EnumField {
            name: "service_type",
            values: ServiceType::VALUES,
            default: None,
        },
        EnumField {
            name: "status",
            values: OrderStatus::VALUES,
            default: Some("pending"),
        },
    ],
    non_negative: &["total_amount"],
};

pub static TASKS: TableModel = TableModel {
    table_name: "tasks",
    columns: &[
        Column::new("id", Uuid),
        Column::new("driver_id", Uuid),
        Column::new("order_id", Uuid),
        Column::new("service_type", Text),
        Column::new("pickup_location", Text),
        Column::new("dropoff_location", Text),
        Column::new("fare", Float),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["driver_id", "service_type", "pickup_location", "dropoff_location"],
    enumerated: &[
        EnumField {
            name: "service_type",
            values: ServiceType::DRIVER_VALUES,
            default: None,
        },
        EnumField {
            name: "status",
            values: TaskStatus::VALUES,
            default: Some("pending"),
        },
    ],
    non_negative: &["fare"],
};

pub static JOBS: TableModel = TableModel {
    table_name: "jobs",
    columns: &[
        Column::new("id", Uuid),
        Column::new("freelancer_id", Uuid),
        Column::new("customer_id", Uuid),
        Column::new("title", Text),
        Column::new("description", Text),
        Column::new("budget", Float),
        Column::new("deadline", Timestamptz),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["freelancer_id", "title"],
    enumerated: &[EnumField {
        name: "status",
        values: JobStatus::VALUES,
        default: Some("open"),
    }],
    non_negative: &["budget"],
};

pub static PRODUCTS: TableModel = TableModel {
    table_name: "products",
    columns: &[
        Column::new("id", Uuid),
        Column::new("seller_id", Uuid),
        Column::new("name", Text),
        Column::new("description", Text),
        Column::new("price", Float),
        Column::new("stock", Int),
        Column::new("category", Text),
        Column::new("image_url", Text),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["seller_id", "name", "price"],
    enumerated: &[EnumField {
        name: "status",
        values: ProductStatus::VALUES,
        default: Some("active"),
    }],
    non_negative: &["price", "stock"],
};

pub static FOOD_ITEMS: TableModel = TableModel {
    table_name: "food_items",
    columns: &[
        Column::new("id", Uuid),
        Column::new("seller_id", Uuid),
        Column::new("name", Text),
        Column::new("description", Text),
        Column::new("price", Float),
        Column::new("category", Text),
        Column::new("preparation_minutes", Int),
        Column::new("is_available", Bool),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["seller_id", "name", "price"],
    enumerated: &[EnumField {
        name: "status",
        values: FoodItemStatus::VALUES,
        default: Some("available"),
    }],
    non_negative: &["price", "preparation_minutes"],
};

pub static SERVICES: TableModel = TableModel {
    table_name: "services",
    columns: &[
        Column::new("id", Uuid),
        Column::new("freelancer_id", Uuid),
        Column::new("title", Text),
        Column::new("description", Text),
        Column::new("price", Float),
        Column::new("category", Text),
        Column::new("delivery_days", Int),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["freelancer_id", "title", "price"],
    enumerated: &[EnumField {
        name: "status",
        values: ServiceStatus::VALUES,
        default: Some("active"),
    }],
    non_negative: &["price", "delivery_days"],
};

pub static SERVICE_OFFERS: TableModel = TableModel {
    table_name: "service_offers",
    columns: &[
        Column::new("id", Uuid),
        Column::new("service_id", Uuid),
        Column::new("customer_id", Uuid),
        Column::new("freelancer_id", Uuid),
        Column::new("message", Text),
        Column::new("proposed_price", Float),
        Column::new("status", Text),
        Column::new("created_at", Timestamptz),
        Column::new("updated_at", Timestamptz),
    ],
    required: &["service_id", "customer_id", "freelancer_id"],
    enumerated: &[EnumField {
        name: "status",
        values: OfferStatus::VALUES,
        default: Some("pending"),
    }],
    non_negative: &["proposed_price"],
};

pub static CUSTOMER_ORDERS: ResourceSpec = ResourceSpec {
    path: "orders",
    model: &ORDERS,
    scope: Scope {
        role: Role::Customer,
        owner_field: "customer_id",
        permissions: Permissions::FULL,
    },
};

pub static CUSTOMER_OFFERS: ResourceSpec = ResourceSpec {
    path: "offers",
    model: &SERVICE_OFFERS,
    scope: Scope {
        role: Role::Customer,
        owner_field: "customer_id",
        permissions: Permissions::FULL,
    },
};

pub static DRIVER_TASKS: ResourceSpec = ResourceSpec {
    path: "tasks",
    model: &TASKS,
    scope: Scope {
        role: Role::Driver,
        owner_field: "driver_id",
        permissions: Permissions::FULL,
    },
};

pub static SELLER_PRODUCTS: ResourceSpec = ResourceSpec {
    path: "products",
    model: &PRODUCTS,
    scope: Scope {
        role: Role::Seller,
        owner_field: "seller_id",
        permissions: Permissions::FULL,
    },
};

pub static SELLER_FOOD_ITEMS: ResourceSpec = ResourceSpec {
    path: "food-items",
    model: &FOOD_ITEMS,
    scope: Scope {
        role: Role::Seller,
        owner_field: "seller_id",
        permissions: Permissions::FULL,
    },
};

pub static FREELANCER_JOBS: ResourceSpec = ResourceSpec {
    path: "jobs",
    model: &JOBS,
    scope: Scope {
        role: Role::Freelancer,
        owner_field: "freelancer_id",
        permissions: Permissions::FULL,
    },
};

pub static FREELANCER_SERVICES: ResourceSpec = ResourceSpec {
    path: "services",
    model: &SERVICES,
    scope: Scope {
        role: Role::Freelancer,
        owner_field: "freelancer_id",
        permissions: Permissions::FULL,
    },
};

/// Freelancers answer offers made to them; they cannot create or remove them.
pub static FREELANCER_OFFERS: ResourceSpec = ResourceSpec {
    path: "offers",
    model: &SERVICE_OFFERS,
    scope: Scope {
        role: Role::Freelancer,
        owner_field: "freelancer_id",
        permissions: Permissions {
            create: false,
            delete: false,
            updatable: Some(&["status"]),
        },
    },
};

pub static RESOURCES: [&ResourceSpec; 8] = [
    &CUSTOMER_ORDERS,
    &CUSTOMER_OFFERS,
    &DRIVER_TASKS,
    &SELLER_PRODUCTS,
    &SELLER_FOOD_ITEMS,
    &FREELANCER_JOBS,
    &FREELANCER_SERVICES,
    &FREELANCER_OFFERS,
];
