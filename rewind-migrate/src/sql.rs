//! SQL text helpers.

/// Collapse a statement batch onto a single line for storage.
///
/// Whitespace runs become one space. Quoted literals and identifiers
/// (`'..'`, `".."`, `` `..` ``, `[..]`, `$tag$..$tag$`) are copied verbatim.
/// Comments are dropped, since `-- comment` followed by a newline would
/// otherwise swallow the next statement once the newline is gone.
pub fn compact_sql(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        if c == '-' && chars.get(i + 1) == Some(&'-') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            pending_space = true;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        let end = match c {
            '\'' | '"' | '`' => closing(&chars, i + 1, &[c]),
            '[' => closing(&chars, i + 1, &[']']),
            '$' if !follows_identifier(&out) => match dollar_tag(&chars, i) {
                Some(tag) => closing(&chars, i + tag.len(), &tag),
                None => i + 1,
            },
            _ => i + 1,
        };

        out.extend(&chars[i..end]);
        i = end;
    }

    out
}

/// Index just past the first occurrence of `delim` at or after `from`, or the end of input.
fn closing(chars: &[char], from: usize, delim: &[char]) -> usize {
    let mut i = from;
    while i + delim.len() <= chars.len() {
        if chars[i..i + delim.len()] == *delim {
            return i + delim.len();
        }
        i += 1;
    }
    chars.len()
}

/// Parse a `$tag$` opener starting at `start`.
fn dollar_tag(chars: &[char], start: usize) -> Option<Vec<char>> {
    let mut i = start + 1;
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    if chars.get(i) != Some(&'$') {
        return None;
    }
    // `$1` style placeholders are not quotes.
    if chars.get(start + 1).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(chars[start..=i].to_vec())
}

fn follows_identifier(out: &str) -> bool {
    out.chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            compact_sql("  create table user (\n\tid integer\n);\n\n"),
            "create table user ( id integer );"
        );
    }

    #[test]
    fn test_preserves_string_literals() {
        assert_eq!(
            compact_sql("INSERT INTO t VALUES ('a   b\n c', 'it''s');"),
            "INSERT INTO t VALUES ('a   b\n c', 'it''s');"
        );
    }

    #[test]
    fn test_drops_line_comments_without_swallowing_statements() {
        let sql = "-- create the table\nCREATE TABLE t (x INT); -- trailing\nCREATE INDEX i ON t (x);";
        assert_eq!(
            compact_sql(sql),
            "CREATE TABLE t (x INT); CREATE INDEX i ON t (x);"
        );
    }

    #[test]
    fn test_comment_markers_inside_literals_survive() {
        assert_eq!(
            compact_sql("SELECT '-- not a comment', \"/* nor this */\";"),
            "SELECT '-- not a comment', \"/* nor this */\";"
        );
    }

    #[test]
    fn test_drops_block_comments() {
        assert_eq!(
            compact_sql("CREATE /* multi\nline */ TABLE t (x INT);"),
            "CREATE TABLE t (x INT);"
        );
    }

    #[test]
    fn test_bracket_and_backtick_identifiers() {
        assert_eq!(
            compact_sql("SELECT [my  col], `other  col` FROM t;"),
            "SELECT [my  col], `other  col` FROM t;"
        );
    }

    #[test]
    fn test_dollar_quoted_bodies() {
        let sql = "CREATE FUNCTION f() RETURNS int AS $$\n  SELECT 1; -- keep\n$$ LANGUAGE sql;";
        assert_eq!(
            compact_sql(sql),
            "CREATE FUNCTION f() RETURNS int AS $$\n  SELECT 1; -- keep\n$$ LANGUAGE sql;"
        );
        assert_eq!(compact_sql("SELECT $1,  $2;"), "SELECT $1, $2;");
    }

    #[test]
    fn test_unterminated_literal_is_copied_to_end() {
        assert_eq!(compact_sql("SELECT 'oops  "), "SELECT 'oops  ");
    }
}
