//! PostgreSQL array literal encoding for the ledger `statements` column

/// Encode statements as a `text[]` literal
///
/// Every element is double-quoted, so delimiters, braces, `NULL` and
/// whitespace survive; only `\` and `"` need escaping inside the quotes.
pub fn encode_text_array(items: &[String]) -> String {
    if items.is_empty() {
        return "{}".to_string();
    }

    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        for ch in item.chars() {
            if ch == '\\' || ch == '"' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `encode_text_array` for one-dimensional quoted literals
    fn decode_text_array(literal: &str) -> Vec<String> {
        let inner = &literal[1..literal.len() - 1];
        let mut items = Vec::new();
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '"' => {
                    let mut item = String::new();
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' => item.extend(chars.next()),
                            '"' => break,
                            other => item.push(other),
                        }
                    }
                    items.push(item);
                }
                ',' => {}
                other => panic!("unexpected character {:?} outside quotes", other),
            }
        }
        items
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(encode_text_array(&[]), "{}");
    }

    #[test]
    fn test_escapes_quotes_and_backslashes() {
        let items = strings(&[r#"INSERT INTO t VALUES ('a"b')"#, r"SELECT E'\n'"]);
        assert_eq!(
            encode_text_array(&items),
            r#"{"INSERT INTO t VALUES ('a\"b')","SELECT E'\\n'"}"#
        );
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            strings(&["CREATE TABLE a (id int)"]),
            strings(&["x", "", "NULL", " padded "]),
            strings(&[r#"\"#, r#"""#, r#"\""#, "{,}", "line1\nline2"]),
            strings(&["COMMENT ON TABLE t IS 'it''s \"quoted\" \\ here'"]),
        ];
        for items in cases {
            assert_eq!(decode_text_array(&encode_text_array(&items)), items);
        }
    }
}
