//! Channel strip widget
//!
//! Renders a strip with its name, the gains of both sides, the balance
//! position, the volume and its link/selection markers.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::GainBar;
use crate::strip::gain::StereoGain;
use crate::strip::{ChannelStrip, StripKind};

/// A channel strip widget showing gains, balance and volume
pub struct StripView<'a> {
    strip: &'a ChannelStrip,

    /// Gains of the strip's routes as the backend holds them
    gains: StereoGain,

    /// Whether the cursor is on this strip
    focused: bool,

    /// Whether the strip carries the selection mark
    marked: bool,

    /// Name of the strip this one follows
    master: Option<&'a str>,
}

impl<'a> StripView<'a> {
    pub fn new(strip: &'a ChannelStrip, gains: StereoGain) -> Self {
        Self {
            strip,
            gains,
            focused: false,
            marked: false,
            master: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn marked(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    pub fn master(mut self, master: Option<&'a str>) -> Self {
        self.master = master;
        self
    }

    /// One-line balance indicator, e.g. `L···│·●··R`
    fn balance_line(balance: f32, width: u16) -> Line<'static> {
        let slots = width.saturating_sub(2).max(1) as usize;
        let pos = (((balance + 1.0) / 2.0) * (slots - 1) as f32).round() as usize;
        let center = (slots - 1) / 2;

        let track: String = (0..slots)
            .map(|i| {
                if i == pos.min(slots - 1) {
                    '●'
                } else if i == center {
                    '│'
                } else {
                    '·'
                }
            })
            .collect();

        Line::from(vec![
            Span::styled("L", Style::default().fg(Color::DarkGray)),
            Span::styled(track, Style::default().fg(Color::Magenta)),
            Span::styled("R", Style::default().fg(Color::DarkGray)),
        ])
    }
}

impl Widget for StripView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let badge = match self.strip.kind() {
            StripKind::MonoToStereo => "M",
            StripKind::StereoToStereo => "S",
        };
        let mark = if self.marked { "*" } else { "" };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {}{} [{}] ", mark, self.strip.name(), badge));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 5 || inner.width < 5 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Gain bars
                Constraint::Length(1), // Balance
                Constraint::Length(1), // Volume
                Constraint::Length(1), // Link
            ])
            .split(inner);

        // Left and right gain bars
        let bars = chunks[0];
        let bar_width = 2.min(bars.width / 2);
        let gap = 1.min(bars.width.saturating_sub(bar_width * 2));
        let x_offset = (bars.width - (bar_width * 2 + gap)) / 2;
        let gains = self.gains;
        let volume_db = self.strip.volume_db();

        GainBar::new(gains.left, volume_db).render(
            Rect {
                x: bars.x + x_offset,
                y: bars.y,
                width: bar_width,
                height: bars.height,
            },
            buf,
        );
        GainBar::new(gains.right, volume_db).render(
            Rect {
                x: bars.x + x_offset + bar_width + gap,
                y: bars.y,
                width: bar_width,
                height: bars.height,
            },
            buf,
        );

        Paragraph::new(Self::balance_line(self.strip.balance(), inner.width))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(format!("{:+.1} dB", volume_db))
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let link = match self.master {
            Some(master) => Span::styled(
                format!("→ {}", master),
                Style::default().fg(Color::Yellow),
            ),
            None => Span::styled("—", Style::default().fg(Color::DarkGray)),
        };
        Paragraph::new(Line::from(link))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}
