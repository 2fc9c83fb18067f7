//! Domain models and response shapes.
//!
//! Row structs derive `sqlx::FromRow` and map one-to-one onto the tables in
//! `migrations/`. Response structs are what the JSON endpoints serialize;
//! nested shapes (order with items, ticket with messages) are assembled in
//! the repository layer.

pub mod catalog;
pub mod order;
pub mod support;
pub mod user;

pub use catalog::{Lab, LabDetail, LabSummary, Product, ProductDetail};
pub use order::{Order, OrderItemResponse, OrderItemWithProduct, OrderResponse, line_total, order_total};
pub use support::{
    LabCount, LabSupport, LabSupportLimit, LabSupportLimitResponse, LabSupportResponse,
    StaffPerformance, SupportMessageResponse, SupportStatistics, SupportTicket,
    SupportTicketResponse, TypeCount, quota_reached,
};
pub use user::{CurrentUser, User, UserPublic, session_keys};
