pub mod banner;
pub mod events;
pub mod store;
pub mod tracking;

pub use banner::{BannerAction, BannerState, ConsentBanner};
pub use events::{ConsentBroadcaster, ConsentChanged};
pub use store::ConsentStore;
pub use tracking::{DeferredWriters, PageVisit, ScrollDepthTracker, ScrollSample, TimeOnPageTracker};
