pub mod auth_service;
pub mod category_service;
pub mod company_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod order_detail_service;
pub mod order_history_service;
pub mod order_service;
pub mod post_service;
pub mod product_service;
pub mod stock;
