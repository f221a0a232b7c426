//! Channel strips
//!
//! Mono-to-stereo and stereo-to-stereo strips share one gain model and
//! differ only in how their two sides map onto backend routes.

mod channel_strip;
pub mod gain;
mod kind;

pub use channel_strip::{Attribute, ChannelStrip, StripChange, StripId};
pub use kind::StripKind;
