//! Gain bar widget
//!
//! Renders the linear gain of one route as a vertical bar on the dB scale
//! of the volume control, with a tick at the strip's master volume.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::ipc::{VOLUME_MAX_DB, VOLUME_MIN_DB};
use crate::strip::gain::amplitude_to_db;

/// Gains above this level are drawn hot (dB)
const HOT_THRESHOLD_DB: f32 = 0.0;

/// Gains below this level are drawn dim (dB)
const QUIET_THRESHOLD_DB: f32 = -24.0;

/// A vertical bar showing one route's gain
pub struct GainBar {
    /// Route gain (linear)
    gain: f32,

    /// Strip volume the bar is measured against (dB)
    volume_db: f32,
}

impl GainBar {
    pub fn new(gain: f32, volume_db: f32) -> Self {
        Self { gain, volume_db }
    }

    /// Position of a dB value on the bar (0.0 bottom, 1.0 top)
    fn db_to_position(db: f32) -> f32 {
        (db.clamp(VOLUME_MIN_DB, VOLUME_MAX_DB) - VOLUME_MIN_DB) / (VOLUME_MAX_DB - VOLUME_MIN_DB)
    }

    fn color_for_db(db: f32) -> Color {
        if db > HOT_THRESHOLD_DB {
            Color::Red
        } else if db >= QUIET_THRESHOLD_DB {
            Color::Cyan
        } else {
            Color::Blue
        }
    }
}

impl Widget for GainBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let total_rows = area.height as f32;
        let filled_rows = if self.gain > 0.0 {
            (Self::db_to_position(amplitude_to_db(self.gain)) * total_rows).ceil() as u16
        } else {
            0
        };
        let volume_row = ((1.0 - Self::db_to_position(self.volume_db)) * total_rows).floor() as u16;

        for row in 0..area.height {
            let y = area.y + row;
            let row_from_bottom = area.height - 1 - row;
            let row_db =
                VOLUME_MIN_DB + row_from_bottom as f32 / total_rows * (VOLUME_MAX_DB - VOLUME_MIN_DB);

            for col in 0..area.width {
                let x = area.x + col;
                let cell = &mut buf[(x, y)];

                if row_from_bottom < filled_rows {
                    cell.set_char('█')
                        .set_style(Style::default().fg(Self::color_for_db(row_db)));
                } else if row == volume_row.min(area.height - 1) {
                    cell.set_char('┄')
                        .set_style(Style::default().fg(Color::Yellow));
                } else {
                    cell.set_char('░')
                        .set_style(Style::default().fg(Color::DarkGray));
                }
            }
        }
    }
}
