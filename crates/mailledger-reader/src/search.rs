//! Search queries.
//!
//! A [`SearchQuery`] other than [`SearchQuery::All`] switches a reader into
//! search mode. Servers cap search results (250 by default), so search mode
//! is sliced differently from index and identifier windows.
//!
//! `Display` renders the query in IMAP SEARCH syntax so a [`MailFolder`]
//! implementation backed by an IMAP session can send it as-is.
//!
//! [`MailFolder`]: crate::MailFolder

use std::fmt::{self, Write as _};

use chrono::{Local, NaiveDate};

use crate::types::IdSet;

/// Search expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchQuery {
    /// Every message. The default; does not activate search mode.
    #[default]
    All,
    /// Messages with the `\Seen` flag.
    Seen,
    /// Messages without the `\Seen` flag.
    Unseen,
    /// Messages with the `\Flagged` flag.
    Flagged,
    /// Messages with the `\Answered` flag.
    Answered,
    /// Messages with the `\Deleted` flag.
    Deleted,
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Body contains text.
    Body(String),
    /// Header or body contains text.
    Text(String),
    /// Named header contains value.
    Header(String, String),
    /// Delivered on or after date.
    Since(NaiveDate),
    /// Delivered before date.
    Before(NaiveDate),
    /// Delivered on date.
    On(NaiveDate),
    /// Larger than size in bytes.
    Larger(u32),
    /// Smaller than size in bytes.
    Smaller(u32),
    /// Identifier set.
    Uid(IdSet),
    /// All criteria must match.
    And(Vec<Self>),
    /// Either criterion matches.
    Or(Box<Self>, Box<Self>),
    /// Criterion does not match.
    Not(Box<Self>),
}

impl SearchQuery {
    /// Returns true for the "match all" query.
    #[must_use]
    pub const fn is_match_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Combines two queries, both of which must match.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::All, q) | (q, Self::All) => q,
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), q) => {
                a.push(q);
                Self::And(a)
            }
            (q, Self::And(mut b)) => {
                b.insert(0, q);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Combines two queries, either of which may match.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negates a query.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Messages delivered between two dates.
    ///
    /// `before` defaults to today.
    #[must_use]
    pub fn between_dates(after: NaiveDate, before: Option<NaiveDate>) -> Self {
        let before = before.unwrap_or_else(|| Local::now().date_naive());
        Self::Since(after).and(Self::Before(before))
    }

    /// Messages whose subject or body contains any of the keywords.
    ///
    /// An empty keyword list yields [`SearchQuery::All`].
    #[must_use]
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        let subject = match_any(&keywords, Self::Subject);
        let body = match_any(&keywords, Self::Body);
        match (subject, body) {
            (Some(subject), Some(body)) => subject.or(body),
            _ => Self::All,
        }
    }

    /// Messages with a matching `Message-ID` header.
    #[must_use]
    pub fn message_id(message_id: &str, add_angle_brackets: bool) -> Self {
        let value = if add_angle_brackets {
            format!("<{message_id}>")
        } else {
            message_id.to_string()
        };
        Self::Header("Message-Id".to_string(), value)
    }
}

fn match_any(keywords: &[String], criterion: fn(String) -> SearchQuery) -> Option<SearchQuery> {
    keywords
        .iter()
        .cloned()
        .map(criterion)
        .reduce(SearchQuery::or)
}

/// Formats a date the way IMAP SEARCH expects it (`1-Feb-2024`).
fn imap_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

/// Writes an astring (atom or quoted string).
fn write_astring(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        f.write_char('"')?;
        for c in s.chars() {
            if c == '"' || c == '\\' {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    } else {
        f.write_str(s)
    }
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

fn write_key(f: &mut fmt::Formatter<'_>, query: &SearchQuery, nested: bool) -> fmt::Result {
    match query {
        SearchQuery::All => f.write_str("ALL"),
        SearchQuery::Seen => f.write_str("SEEN"),
        SearchQuery::Unseen => f.write_str("UNSEEN"),
        SearchQuery::Flagged => f.write_str("FLAGGED"),
        SearchQuery::Answered => f.write_str("ANSWERED"),
        SearchQuery::Deleted => f.write_str("DELETED"),
        SearchQuery::Subject(s) => {
            f.write_str("SUBJECT ")?;
            write_astring(f, s)
        }
        SearchQuery::From(s) => {
            f.write_str("FROM ")?;
            write_astring(f, s)
        }
        SearchQuery::To(s) => {
            f.write_str("TO ")?;
            write_astring(f, s)
        }
        SearchQuery::Body(s) => {
            f.write_str("BODY ")?;
            write_astring(f, s)
        }
        SearchQuery::Text(s) => {
            f.write_str("TEXT ")?;
            write_astring(f, s)
        }
        SearchQuery::Header(name, value) => {
            f.write_str("HEADER ")?;
            write_astring(f, name)?;
            f.write_char(' ')?;
            write_astring(f, value)
        }
        SearchQuery::Since(date) => write!(f, "SINCE {}", imap_date(*date)),
        SearchQuery::Before(date) => write!(f, "BEFORE {}", imap_date(*date)),
        SearchQuery::On(date) => write!(f, "ON {}", imap_date(*date)),
        SearchQuery::Larger(size) => write!(f, "LARGER {size}"),
        SearchQuery::Smaller(size) => write!(f, "SMALLER {size}"),
        SearchQuery::Uid(set) => write!(f, "UID {set}"),
        SearchQuery::And(criteria) => match criteria.as_slice() {
            [] => f.write_str("ALL"),
            [single] => write_key(f, single, nested),
            _ => {
                if nested {
                    f.write_char('(')?;
                }
                for (i, c) in criteria.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write_key(f, c, true)?;
                }
                if nested {
                    f.write_char(')')?;
                }
                Ok(())
            }
        },
        SearchQuery::Or(a, b) => {
            f.write_str("OR ")?;
            write_key(f, a, true)?;
            f.write_char(' ')?;
            write_key(f, b, true)
        }
        SearchQuery::Not(c) => {
            f.write_str("NOT ")?;
            write_key(f, c, true)
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_key(f, self, false)
    }
}
