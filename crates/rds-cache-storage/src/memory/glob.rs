//! Glob matching with the store's KEYS/SCAN semantics
//!
//! Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and `\` escapes.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Star,
    Any,
    Literal(char),
    Class { negated: bool, items: Vec<ClassItem> },
}

#[derive(Debug, Clone, PartialEq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Star | Token::Any => true,
            Token::Literal(l) => *l == c,
            Token::Class { negated, items } => {
                let hit = items.iter().any(|item| match *item {
                    ClassItem::Single(s) => s == c,
                    ClassItem::Range(lo, hi) => (lo..=hi).contains(&c),
                });
                hit != *negated
            }
        }
    }
}

/// Check whether `text` matches the glob `pattern`
///
/// Runs in O(pattern * text): on a mismatch only the most recent `*` is
/// retried.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let tokens = tokenize(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Token after the last star and the text position it is tried from
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Star) => {
                p += 1;
                resume = Some((p, t));
                continue;
            }
            Some(token) if token.matches(text[t]) => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match resume {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                resume = Some((star_p, t));
            }
            None => return false,
        }
    }

    tokens[p..].iter().all(|token| *token == Token::Star)
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::Any);
                i += 1;
            }
            '[' => match parse_class(&chars[i + 1..]) {
                Some((token, consumed)) => {
                    tokens.push(token);
                    i += 1 + consumed;
                }
                // Unterminated class: treat '[' literally
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            '\\' if i + 1 < chars.len() => {
                tokens.push(Token::Literal(chars[i + 1]));
                i += 2;
            }
            literal => {
                tokens.push(Token::Literal(literal));
                i += 1;
            }
        }
    }

    tokens
}

/// Parse a class body starting just after `[`
///
/// Returns the class and the number of chars consumed, closing `]` included.
fn parse_class(body: &[char]) -> Option<(Token, usize)> {
    let (negated, mut i) = match body.first() {
        Some('^') => (true, 1),
        _ => (false, 0),
    };
    let mut items = Vec::new();

    while i < body.len() {
        match body[i] {
            ']' => return Some((Token::Class { negated, items }, i + 1)),
            '\\' if i + 1 < body.len() => {
                items.push(ClassItem::Single(body[i + 1]));
                i += 2;
            }
            lo if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' => {
                let hi = body[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                items.push(ClassItem::Range(lo, hi));
                i += 3;
            }
            other => {
                items.push(ClassItem::Single(other));
                i += 1;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        assert!(glob_match("user_1", "user_1"));
        assert!(!glob_match("user_1", "user_12"));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("Order_*", "Order_5"));
        assert!(glob_match("*_5", "Order_5"));
        assert!(glob_match("O**r_*5", "Order_15"));
        assert!(!glob_match("Order_*", "Price_5"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("h?llo", "hello"));
        assert!(!glob_match("h?llo", "hllo"));
    }

    #[test]
    fn test_classes() {
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("h[^e]llo", "hallo"));
        assert!(!glob_match("h[^e]llo", "hello"));
        assert!(glob_match("key[0-9]", "key7"));
        assert!(!glob_match("key[0-9]", "keyx"));
    }

    #[test]
    fn test_escape() {
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
    }

    #[test]
    fn test_unterminated_class_is_literal() {
        assert!(glob_match("a[b", "a[b"));
        assert!(glob_match("a[*", "a[xyz"));
    }

    #[test]
    fn test_star_backtracking() {
        assert!(glob_match("*a*b", "xaxxaxb"));
        assert!(glob_match("a*b*c", "abbbc"));
        assert!(!glob_match("a*b*c", "abbb"));
        assert!(glob_match("*?", "x"));
        assert!(!glob_match("*?", ""));
    }

    #[test]
    fn test_many_stars_on_long_key() {
        let key = "a".repeat(200);
        assert!(!glob_match("*a*a*a*a*a*a*a*a*a*a*b", &key));
        assert!(glob_match("*a*a*a*a*a*a*a*a*a*a*", &key));
    }
}
