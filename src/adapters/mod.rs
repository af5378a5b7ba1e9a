//! Adapter implementations for port traits.
//!
//! - `live/`: HTTP avatar downloads and the Discord gateway
//! - `recording/`: Record avatar downloads to cassettes
//! - `replaying/`: Replay avatar downloads from cassettes

pub mod live;
pub mod recording;
pub mod replaying;
