//! Named placeholder scanning.
//!
//! Finds `:name` tokens in SQL text, skipping quoted strings and
//! identifiers, and lets the caller substitute each one. Used to
//! interpolate values into debug output and by drivers that only speak
//! positional `?` parameters.

/// Replaces every `:name` token in `sql` with the output of `replace`.
///
/// A token is a `:` followed by an ASCII letter or `_`, then any run of
/// ASCII alphanumerics and `_`. Text inside `'...'`, `"..."` and
/// `` `...` `` is copied unchanged, as are `::` sequences.
///
/// # Errors
///
/// Stops at and returns the first error produced by `replace`.
pub fn rewrite<E>(
    sql: &str,
    mut replace: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => {
                quote = Some(b);
                i += 1;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_') =>
            {
                let mut end = i + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                out.push_str(&sql[start..i]);
                out.push_str(&replace(&sql[i + 1..end])?);
                start = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[start..]);
    Ok(out)
}

/// Lists the placeholder names of `sql` in order of appearance.
#[must_use]
pub fn names(sql: &str) -> Vec<String> {
    let mut found = Vec::new();
    let _ = rewrite::<std::convert::Infallible>(sql, |name| {
        found.push(name.to_owned());
        Ok(String::new())
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_in_order() {
        assert_eq!(
            names("select * from t where a=:a and b between :b and :b2"),
            vec!["a", "b", "b2"]
        );
    }

    #[test]
    fn test_quoted_text_is_skipped() {
        assert_eq!(names("select ':no', `x:y` from t where c=:c"), vec!["c"]);
    }

    #[test]
    fn test_double_colon_is_not_a_placeholder() {
        assert_eq!(names("select a::text, :b"), vec!["b"]);
    }

    #[test]
    fn test_rewrite_to_positional() {
        let sql =
            rewrite::<()>("update t set a=:a where id=:id", |_| Ok(String::from("?"))).unwrap();
        assert_eq!(sql, "update t set a=? where id=?");
    }

    #[test]
    fn test_rewrite_error_stops() {
        let err = rewrite("x=:missing", |name| Err(name.to_owned())).unwrap_err();
        assert_eq!(err, "missing");
    }
}
