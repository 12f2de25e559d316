pub mod inventory_alert;

pub use inventory_alert::InventoryAlertWorker;
