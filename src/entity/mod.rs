pub mod categories;
pub mod companies;
pub mod customers;
pub mod order_details;
pub mod order_history;
pub mod orders;
pub mod posts;
pub mod products;
pub mod users;

pub use categories::Entity as Categories;
pub use companies::Entity as Companies;
pub use customers::Entity as Customers;
pub use order_details::Entity as OrderDetails;
pub use order_history::Entity as OrderHistory;
pub use orders::Entity as Orders;
pub use posts::Entity as Posts;
pub use products::Entity as Products;
pub use users::Entity as Users;
