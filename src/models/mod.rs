pub mod image;

pub use image::{ImageRecord, MediaType};
