pub mod raw;
pub mod record;

pub use raw::RawRecord;
pub use record::{AgeBracket, GenderLabel, NormalizedRecord};
