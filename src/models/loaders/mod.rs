pub mod batch_loader;

pub use batch_loader::{load_batch_folder, BatchFolder, XmlDocument};
