/// Render rows of string cells as a bordered text table.
pub fn render_table(captions: &[&str], rows: &[Vec<String>]) -> String {
    // Column widths: start from the captions, widen to the largest cell.
    let mut widths: Vec<usize> = captions.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let sep_line: String = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    };

    let format_row = |cells: &[String]| -> String {
        let mut line = String::from("|");
        for (cell, w) in cells.iter().zip(&widths) {
            line.push_str(&format!(" {:width$} |", cell, width = w));
        }
        line
    };

    let caption_cells: Vec<String> = captions.iter().map(|c| c.to_string()).collect();

    let mut out = String::new();
    out.push_str(&sep_line);
    out.push('\n');
    out.push_str(&format_row(&caption_cells));
    out.push('\n');
    out.push_str(&sep_line);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out.push_str(&sep_line);
    out.push('\n');
    out
}
