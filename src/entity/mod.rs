pub mod admin_users;
pub mod audit_logs;
pub mod categories;
pub mod customers;
pub mod order_items;
pub mod orders;
pub mod products;

pub use admin_users::Entity as AdminUsers;
pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use customers::Entity as Customers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
