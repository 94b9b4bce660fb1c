pub mod ad;
pub mod tag;

pub use ad::{Ad, AdChanges, AdCut, AdDetail, AdPayload, NewAd};
pub use tag::Tag;
