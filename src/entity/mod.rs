pub mod customers;
pub mod employees;
pub mod notifications;
pub mod products;
pub mod sale_items;
pub mod sales;

pub use customers::Entity as Customers;
pub use employees::Entity as Employees;
pub use notifications::Entity as Notifications;
pub use products::Entity as Products;
pub use sale_items::Entity as SaleItems;
pub use sales::Entity as Sales;
