//! JSON Pointer helpers (RFC 6901)

use std::borrow::Cow;

/// Escape one reference token (`~` → `~0`, `/` → `~1`)
#[must_use]
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Reverse of [`escape_token`]
#[must_use]
pub fn unescape_token(token: &str) -> Cow<'_, str> {
    if token.contains('~') {
        Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Build a pointer from unescaped tokens; no tokens yields the root pointer `""`
#[must_use]
pub fn from_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().fold(String::new(), |mut pointer, token| {
        pointer.push('/');
        pointer.push_str(&escape_token(token.as_ref()));
        pointer
    })
}

/// Unescaped tokens of a pointer
#[must_use]
pub fn tokens(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|token| unescape_token(token).into_owned())
        .collect()
}

/// Legacy dotted property path for a pointer (`/a/b/0` → `a.b.0`)
#[must_use]
pub fn to_property_path(pointer: &str) -> String {
    tokens(pointer).join(".")
}
