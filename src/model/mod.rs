//! Output types produced by the recognition engine.

mod media_type;
mod record;

pub use media_type::MediaType;
pub use record::TitleRecord;
