//! File domain entities.

pub mod check;
pub mod gallery;
pub mod model;
pub mod thumbnail;

pub use check::FileCheckRecord;
pub use gallery::{GalleryItem, GalleryQuery, GallerySort, MediaFilter};
pub use model::{File, InsertOutcome, NewFile};
pub use thumbnail::{NewThumbnail, Thumbnail};
