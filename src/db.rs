pub mod user_repo;
pub use user_repo::UserRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
