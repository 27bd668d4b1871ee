mod clock;
mod config;
mod identity;
mod similarity;
mod store;
mod tracklet;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ReidConfig, StoreConfig, TrackletConfig};
pub use identity::GlobalIdentity;
pub use similarity::{Embedding, cosine_similarity};
pub use store::{GlobalIdentityStore, MatchResult};
pub use tracklet::TrackletState;
