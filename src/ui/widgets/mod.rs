//! Custom widgets for the strip mixer UI

mod channel_strip;
mod gain_bar;

pub use channel_strip::StripView;
pub use gain_bar::GainBar;
