//! 最小化的分隔文本解析
//!
//! 支持双引号包裹的字段（字段内可包含逗号），`""` 表示字面量双引号。

/// 字段分隔符
pub const DELIMITER: char = ',';

/// 引号字符
pub const QUOTE: char = '"';

/// 将一行文本拆分为字段
///
/// 未闭合的引号会吞掉该行剩余的全部内容。
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == QUOTE {
            if in_quotes && chars.peek() == Some(&QUOTE) {
                current.push(QUOTE);
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
            continue;
        }

        if ch == DELIMITER && !in_quotes {
            fields.push(std::mem::take(&mut current));
            continue;
        }

        current.push(ch);
    }

    fields.push(current);
    fields
}

/// 按行拆分文本（兼容 `\n` 与 `\r\n`）
pub fn split_rows(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// 将字段编码为一行文本
pub fn write_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| quote_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

fn quote_field(field: &str) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\r' || c == '\n');

    if needs_quotes {
        format!("\"{}\"", field.replace(QUOTE, "\"\""))
    } else {
        field.to_string()
    }
}
