// the collection of utility functions mainly for bracket parsing and proceeding

/// true when every bracket is closed in the right order
pub fn brackets_balanced(s: &str) -> bool {
    let mut depth = 0i64;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// byte position of the first unmatched bracket (either a `)` without opener or the
/// outermost `(` that is never closed)
pub fn first_unmatched_bracket(s: &str) -> Option<usize> {
    let mut stack: Vec<usize> = Vec::new();
    for (i, c) in s.char_indices() {
        match c {
            '(' => stack.push(i),
            ')' => {
                if stack.pop().is_none() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    stack.first().copied()
}

/// byte positions of `target` that are not enclosed in brackets
pub fn find_char_positions_outside_brackets(s: &str, target: char) -> Vec<usize> {
    let mut depth = 0i64;
    let mut positions = Vec::new();
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ch if ch == target && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

// code finds the position of the bracket closing the one at `bracket_start` (byte index)
pub fn find_pair_to_this_bracket(input: &str, bracket_start: usize) -> Option<usize> {
    let mut depth = 0i64;
    for (i, c) in input[bracket_start..].char_indices() {
        if c == '(' {
            depth += 1;
        } else if c == ')' {
            depth -= 1;
            if depth == 0 {
                return Some(bracket_start + i);
            }
        }
    }
    None
}

/// splits at commas that sit outside brackets
pub fn split_outside_brackets(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in find_char_positions_outside_brackets(s, separator) {
        parts.push(&s[start..pos]);
        start = pos + separator.len_utf8();
    }
    parts.push(&s[start..]);
    parts
}

/// `(inner)` whose opening bracket is matched by the very last character
pub fn strip_enclosing_brackets(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.starts_with('(') && find_pair_to_this_bracket(s, 0) == Some(s.len() - 1) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}
