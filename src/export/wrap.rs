/// Characters per physical line. Body text is set in 10pt Courier,
/// where every glyph advances 6pt, and an A4 page with 42pt margins
/// leaves 511pt of line width.
pub const MAX_LINE_CHARS: usize = 85;

/// Greedy word wrap of a single paragraph into lines of at most
/// `width` characters. Words wider than a line are split. Breaks
/// consume the space they replace.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let line = line.trim_end();
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Whether `current` holds at least one (possibly empty) word
    let mut started = false;

    for word in line.split(' ') {
        let mut chars: Vec<char> = word.chars().collect();

        if chars.len() > width {
            if started {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                started = false;
            }
            while chars.len() > width {
                let rest = chars.split_off(width);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
        }

        let word_len = chars.len();
        if started && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }
        if started {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
        started = true;
    }

    if started {
        lines.push(current);
    }
    lines
}
