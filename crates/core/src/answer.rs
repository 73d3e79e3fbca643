//! Raw trivia answers arrive decorated: `<i>Macbeth</i>`, `(Sir) Isaac
//! Newton`, `Gandalf (or Mithrandir)`, `the Nile`. The normalizer strips the
//! decoration into the one or two forms a reply is allowed to match.
//!
//! The slice offsets reproduce the bot's historical behavior exactly,
//! including the quirks: a leading `<` is treated as markup without checking
//! that it is a real tag, and the article rules are plain prefix checks, so
//! `apple` and `theme` are "articles" too. Changing either silently would
//! change which replies count as correct.

/// The 1-2 normalized answer strings a reply must match to be correct.
///
/// Never empty: when no rule applies, or a rule's slicing falls out of
/// bounds or off a char boundary, the raw answer is accepted verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedAnswers {
    primary: String,
    secondary: Option<String>,
}

impl AcceptedAnswers {
    /// Derives the accepted forms of `raw`, first matching rule wins:
    ///
    /// 1. leading `<` - text between the first `>` and the last `<`
    /// 2. leading `(` - text inside the parens, plus the remainder after
    ///    the closing paren and one separator character
    /// 3. trailing `)` - text before the opening paren (less a two-char
    ///    separator), plus the paren interior (less the leading separator)
    /// 4. leading `a` - the raw answer, plus the answer from offset 2
    /// 5. leading `the` - the raw answer, plus the answer from offset 4
    /// 6. anything else - the raw answer alone
    pub fn normalize(raw: &str) -> Self {
        match extract(raw) {
            Some((primary, secondary)) if !primary.is_empty() => Self { primary, secondary },
            _ => Self { primary: raw.to_owned(), secondary: None },
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Accepted forms in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref())
    }

    pub fn len(&self) -> usize {
        1 + usize::from(self.secondary.is_some())
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

fn extract(raw: &str) -> Option<(String, Option<String>)> {
    if raw.starts_with('<') {
        let open = raw.find('>')?;
        let close = raw.rfind('<')?;
        let inner = raw.get(open + 1..close)?;
        return Some((inner.to_owned(), None));
    }

    if raw.starts_with('(') {
        let close = raw.find(')')?;
        let primary = raw.get(1..close)?;
        // one separator character after the closing paren is skipped
        let secondary = raw.get(close + 2..).unwrap_or("");
        return Some((primary.to_owned(), non_empty(secondary)));
    }

    if raw.ends_with(')') {
        let open = raw.find('(')?;
        let close = raw.find(')')?;
        let primary = raw.get(..open.checked_sub(2)?)?;
        let secondary = raw.get(open + 4..close.checked_sub(1)?).unwrap_or("");
        return Some((primary.to_owned(), non_empty(secondary)));
    }

    // Plain prefix checks, not word boundaries. "apple" and "theme" are
    // misclassified here on purpose; see the module docs.
    if raw.starts_with('a') {
        let secondary = raw.get(2..).unwrap_or("");
        return Some((raw.to_owned(), non_empty(secondary)));
    }

    if raw.starts_with("the") {
        let secondary = raw.get(4..).unwrap_or("");
        return Some((raw.to_owned(), non_empty(secondary)));
    }

    Some((raw.to_owned(), None))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
