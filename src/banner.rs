use figlet_rs::FIGfont;
use rand::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const BANNER_TEXT: &str = "SDK CONSOLE";

#[derive(Clone)]
struct BufferChar {
    char: char,
    style: Style,
}

fn figlet_lines() -> Vec<String> {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(BANNER_TEXT).map(|figure| figure.to_string()))
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_else(|| vec![BANNER_TEXT.to_string()])
}

/// Rows of the figlet banner centred in `width`, with a sparse glitch
/// effect that drifts with `tick_count`.
pub fn get_styled_banner_lines(width: u16, tick_count: u64, glitch: bool) -> Vec<Line<'static>> {
    let figlet_lines = figlet_lines();
    let figlet_width = figlet_lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let banner_height = figlet_lines.len() + 2; // one padding line above and below

    let mut buffer: Vec<Vec<BufferChar>> = vec![
        vec![
            BufferChar {
                char: ' ',
                style: Style::default(),
            };
            width as usize
        ];
        banner_height
    ];

    let start_y = 1;
    let start_x = (width as usize).saturating_sub(figlet_width) / 2;

    for (y, line) in figlet_lines.iter().enumerate() {
        for (x, char) in line.chars().enumerate() {
            if let Some(cell) = buffer
                .get_mut(start_y + y)
                .and_then(|row| row.get_mut(start_x + x))
            {
                if char != ' ' {
                    cell.char = char;
                    cell.style = Style::default().fg(Color::Cyan);
                }
            }
        }
    }

    if glitch {
        let mut rng = thread_rng();
        for (y, row) in buffer.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let glitch_chance =
                    0.0005 + (tick_count as f64 * 0.01 + (y as f64 * 0.5) + (x as f64 * 0.01)).cos().powi(2) * 0.001;
                if rng.gen_bool(glitch_chance) {
                    cell.style = cell.style.bg(Color::Black).fg(Color::Rgb(100, 255, 255));
                    if rng.gen_bool(0.5) {
                        cell.char = *['█', '▓', '▒', '░'].choose(&mut rng).unwrap_or(&' ');
                    }
                }
            }
        }
    }

    buffer
        .into_iter()
        .map(|row| {
            let mut spans = Vec::new();
            let mut current_style = Style::default();
            let mut current_text = String::new();

            for cell in row {
                if cell.style == current_style {
                    current_text.push(cell.char);
                } else {
                    if !current_text.is_empty() {
                        spans.push(Span::styled(current_text, current_style));
                    }
                    current_style = cell.style;
                    current_text = String::from(cell.char);
                }
            }
            if !current_text.is_empty() {
                spans.push(Span::styled(current_text, current_style));
            }
            Line::from(spans)
        })
        .collect()
}
