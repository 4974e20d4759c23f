//! WHERE-clause injection into pre-written queries.
//!
//! The base query is split at its first top-level trailing clause
//! (GROUP BY, HAVING, ORDER BY or LIMIT). Predicates go at the end of the
//! head, joined with AND when the head already has a WHERE. The tail is
//! reattached untouched.
//!
//! Keywords are only recognised at the top level: text inside quoted
//! literals or identifiers (`'..'`, `".."`, backticks, `[..]`), comments,
//! and parentheses (subqueries, window specs, function calls) is masked
//! before matching.
//!
//! In a compound query (UNION, INTERSECT, EXCEPT) predicates land on the
//! last SELECT only, and only its own WHERE decides between WHERE and AND.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(group\s+by|having|order\s+by|limit)\b").expect("valid trailing clause regex")
});

static WHERE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwhere\b").expect("valid where regex")
});

static COMPOUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(union|intersect|except)\b").expect("valid compound operator regex")
});

/// A base query cut at its first top-level trailing clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitQuery<'a> {
    /// Everything before the trailing clause, trailing whitespace removed.
    pub head: &'a str,
    /// The trailing clause and everything after it. Empty when absent.
    pub tail: &'a str,
    pub head_has_where: bool,
}

/// Strip surrounding whitespace and any trailing `;` terminators.
pub fn normalize_base(sql: &str) -> &str {
    let mut s = sql.trim();
    while let Some(rest) = s.strip_suffix(';') {
        s = rest.trim_end();
    }
    s
}

/// Split `base` (already normalized) into head and tail.
pub fn split_trailing_clause(base: &str) -> SplitQuery<'_> {
    let masked = top_level_mask(base);

    let (head, tail) = match TRAILING_CLAUSE_RE.find(&masked) {
        Some(m) => (base[..m.start()].trim_end(), &base[m.start()..]),
        None => (base, ""),
    };
    let head_mask = &masked[..head.len()];
    let last_select = COMPOUND_RE.find_iter(head_mask).last().map_or(0, |m| m.end());
    let head_has_where = WHERE_RE.is_match(&head_mask[last_select..]);

    SplitQuery { head, tail, head_has_where }
}

/// Inject `predicates` (an AND-joined condition, possibly empty) into
/// `base_sql` and terminate the statement with a single `;`.
pub fn splice_predicates(base_sql: &str, predicates: &str) -> String {
    let split = split_trailing_clause(normalize_base(base_sql));
    let predicates = predicates.trim();

    let mut out = String::with_capacity(split.head.len() + split.tail.len() + predicates.len() + 16);
    out.push_str(split.head);
    if !predicates.is_empty() {
        out.push_str(separator_after(&out));
        out.push_str(if split.head_has_where { "AND " } else { "WHERE " });
        out.push_str(predicates);
    }
    if !split.tail.is_empty() {
        out.push_str(separator_after(&out));
        out.push_str(split.tail);
    }
    if ends_in_line_comment(&out) {
        out.push('\n');
    }
    out.push(';');
    out
}

/// A space, unless that would land inside a trailing `--` comment.
fn separator_after(sql: &str) -> &'static str {
    if ends_in_line_comment(sql) { "\n" } else { " " }
}

fn ends_in_line_comment(sql: &str) -> bool {
    scan(sql).1 == Lex::LineComment
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Copy of `sql` where everything not at paren depth zero, or inside a
/// literal, quoted identifier or comment, is replaced by spaces. Byte
/// offsets are preserved so matches index straight into the original.
fn top_level_mask(sql: &str) -> String {
    scan(sql).0
}

/// Produce the mask and the lexer state at end of input.
fn scan(sql: &str) -> (String, Lex) {
    let mut out = String::with_capacity(sql.len());
    let mut lex = Lex::Code;
    let mut depth: usize = 0;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        let mut visible = false;
        match lex {
            Lex::Code => match c {
                '\'' | '"' | '`' => lex = Lex::Quoted(c),
                '[' => lex = Lex::Quoted(']'),
                '-' if chars.peek() == Some(&'-') => lex = Lex::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    // The opening `*` cannot also close the comment.
                    chars.next();
                    out.push_str("  ");
                    lex = Lex::BlockComment;
                    continue;
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => visible = depth == 0,
            },
            Lex::Quoted(q) => {
                if c == q {
                    lex = Lex::Code;
                }
            }
            Lex::LineComment => {
                if c == '\n' {
                    lex = Lex::Code;
                }
            }
            Lex::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    lex = Lex::Code;
                    continue;
                }
            }
        }

        if visible {
            out.push(c);
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }
    (out, lex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_preserves_byte_length() {
        let sql = "SELECT 'é ORDER BY' FROM t /* limit */ -- having\nWHERE (x) ORDER BY y";
        let masked = top_level_mask(sql);
        assert_eq!(masked.len(), sql.len());
        assert!(!masked.contains("limit"));
        assert!(!masked.contains("having"));
        assert!(masked.contains("ORDER BY y"));
    }

    #[test]
    fn doubled_quote_stays_inside_literal() {
        let masked = top_level_mask("SELECT 'it''s order by' AS a");
        assert!(!masked.to_lowercase().contains("order"));
    }

    #[test]
    fn slash_star_slash_opens_a_comment() {
        let masked = top_level_mask("SELECT 1 /*/ ORDER BY x */ FROM t");
        assert!(!masked.contains("ORDER"));
        assert!(masked.contains("FROM t"));
    }

    #[test]
    fn bracketed_identifier_is_masked() {
        let masked = top_level_mask("SELECT [order by] FROM t");
        assert!(!masked.contains("order"));
        assert_eq!(masked.len(), "SELECT [order by] FROM t".len());
    }

    #[test]
    fn normalize_strips_terminators_and_whitespace() {
        assert_eq!(normalize_base("  SELECT 1 ;; \n"), "SELECT 1");
        assert_eq!(normalize_base("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn split_without_trailing_clause_keeps_whole_query_as_head() {
        let split = split_trailing_clause("SELECT * FROM t WHERE a = 1");
        assert_eq!(split.head, "SELECT * FROM t WHERE a = 1");
        assert_eq!(split.tail, "");
        assert!(split.head_has_where);
    }

    #[test]
    fn split_takes_first_trailing_clause() {
        let split = split_trailing_clause("SELECT a, COUNT(*) FROM t\nGROUP BY a\nHAVING COUNT(*) > 1\nORDER BY a");
        assert_eq!(split.head, "SELECT a, COUNT(*) FROM t");
        assert_eq!(split.tail, "GROUP BY a\nHAVING COUNT(*) > 1\nORDER BY a");
        assert!(!split.head_has_where);
    }

    #[test]
    fn identifiers_containing_keywords_are_not_clauses() {
        let split = split_trailing_clause("SELECT rate_limit, order_by_col FROM t");
        assert_eq!(split.tail, "");
    }
}
