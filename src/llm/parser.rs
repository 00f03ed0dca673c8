use crate::error::{Error, Result};
use crate::models::Label;

pub fn parse_numbered_list(response: &str) -> Result<Vec<String>> {
    let items: Vec<String> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(|line| strip_ordinal(line).to_string())
        .collect();

    if items.is_empty() {
        return Err(Error::ParseError("Empty list in LLM response".to_string()));
    }

    Ok(items)
}

pub fn parse_labels(response: &str) -> Result<Vec<Label>> {
    Ok(parse_numbered_list(response)?
        .iter()
        .map(|line| Label::from_model_output(line))
        .collect())
}

pub fn fit_to_batch<T>(mut items: Vec<T>, len: usize, mut pad: impl FnMut(usize) -> T) -> Vec<T> {
    items.truncate(len);
    while items.len() < len {
        let index = items.len();
        items.push(pad(index));
    }
    items
}

fn strip_ordinal(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }

    let rest = &line[digits..];
    match rest.chars().next() {
        Some(sep @ ('.' | '、' | ')' | '．' | ':' | '：')) => rest[sep.len_utf8()..].trim_start(),
        _ => line,
    }
}
