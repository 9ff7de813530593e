// Markdown formatting utilities for ladder rendering

/// Build a markdown table with every column padded to its widest cell
///
/// Widths count characters, so bar glyphs line up with digits. Rows shorter
/// than the header are padded with empty cells.
pub fn build_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = String::new();
    push_row(&mut table, headers.iter().copied(), &widths);

    table.push('|');
    for width in &widths {
        table.push_str(&"-".repeat(width + 2));
        table.push('|');
    }
    table.push('\n');

    for row in rows {
        push_row(&mut table, row.iter().map(String::as_str), &widths);
    }

    table
}

fn push_row<'a>(table: &mut String, mut cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    table.push('|');
    for width in widths {
        let cell = cells.next().unwrap_or("");
        let pad = width - cell.chars().count().min(*width);
        table.push(' ');
        table.push_str(cell);
        table.push_str(&" ".repeat(pad));
        table.push_str(" |");
    }
    table.push('\n');
}

/// Build a markdown section header
pub fn build_section_header(title: &str, level: u8) -> String {
    let hashes = "#".repeat(level as usize);
    format!("{} {}\n\n", hashes, title)
}

/// Horizontal bar proportional to a depth fraction
///
/// `fraction` is clamped to [0, 1]; the bar is padded with spaces to `width`.
/// Bid bars grow from the right (towards the spread), ask bars from the left.
pub fn depth_bar(fraction: f64, width: usize, from_right: bool) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * width as f64).round() as usize;
    let bar = "█".repeat(filled);
    let pad = " ".repeat(width - filled);

    if from_right {
        format!("{}{}", pad, bar)
    } else {
        format!("{}{}", bar, pad)
    }
}
