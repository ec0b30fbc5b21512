//! List-valued cells, written the way the research exports write them:
//! `['alice', 'bob']`.

use devmove_core::DevmoveError;

/// Parse a list literal such as `['a', 'b']`, `["a","b"]`, or `[]`.
///
/// A blank cell is an empty list.
///
/// # Errors
///
/// Returns [`DevmoveError::InputValidation`] if the cell is not a bracketed
/// list of quoted strings.
///
/// # Examples
///
/// ```
/// use devmove_ingest::lists::parse_list;
///
/// assert_eq!(parse_list("['alice', \"bob\"]").unwrap(), vec!["alice", "bob"]);
/// assert!(parse_list("[]").unwrap().is_empty());
/// assert!(parse_list("alice, bob").is_err());
/// ```
pub fn parse_list(cell: &str) -> Result<Vec<String>, DevmoveError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| malformed(cell, "expected [...]"))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return Err(malformed(cell, "expected a quoted item"));
        }

        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => item.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => item.push(c),
            }
        }
        if !closed {
            return Err(malformed(cell, "unterminated string"));
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return Err(malformed(cell, "expected ',' between items")),
        }
    }

    Ok(items)
}

/// Render items as a single-quoted list literal readable by [`parse_list`].
///
/// # Examples
///
/// ```
/// use devmove_ingest::lists::render_list;
///
/// assert_eq!(render_list(["alice", "bob"]), "['alice', 'bob']");
/// assert_eq!(render_list(Vec::<String>::new()), "[]");
/// ```
pub fn render_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = items
        .into_iter()
        .map(|item| {
            let escaped = item.as_ref().replace('\\', "\\\\").replace('\'', "\\'");
            format!("'{escaped}'")
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn malformed(cell: &str, reason: &str) -> DevmoveError {
    DevmoveError::InputValidation(format!("malformed list {cell:?}: {reason}"))
}
