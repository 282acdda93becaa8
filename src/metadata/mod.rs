//! Metadata resolution.
//!
//! - `model`: `ComicMetadata`, `Provenance`, `ContentType`
//! - `comic_info`: embedded ComicInfo.xml extraction and parsing
//! - `resolver`: embedded-first resolution with filename fallback

mod comic_info;
mod model;
mod resolver;

pub use comic_info::{
    extract_comic_info, parse_comic_info_xml, ComicInfo, COMIC_INFO_ENTRY,
    ZIP_CONTAINER_EXTENSIONS,
};
pub use model::*;
pub use resolver::*;
