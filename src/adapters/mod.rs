//! Port implementations: live drivers plus cassette recording and replay.

pub mod live;
pub mod recording;
pub mod replaying;
