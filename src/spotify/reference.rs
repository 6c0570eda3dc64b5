use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{Error, Result},
    types::{ContentKind, ContentRef},
};

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?open\.spotify\.com/(?:intl-[a-zA-Z]{2}(?:-[a-zA-Z]{2})?/)?(track|episode|album|playlist|show)/([0-9A-Za-z]{22})(?:[/?#].*)?$",
    )
    .expect("static regex")
});

static URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^spotify:(track|episode|album|playlist|show):([0-9A-Za-z]{22})$")
        .expect("static regex")
});

static BARE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{22}$").expect("static regex"));

/// Parses a user-supplied reference into a [`ContentRef`].
///
/// Accepted forms:
/// - `https://open.spotify.com/[intl-xx/]{kind}/{id}[?si=...]`
/// - `spotify:{kind}:{id}`
/// - a bare 22-character base62 `{id}`, taken to be a track
///
/// # Errors
///
/// [`Error::InvalidReference`] when the input matches none of the forms.
pub fn classify(reference: &str) -> Result<ContentRef> {
    let reference = reference.trim();

    let captures = URL_REGEX
        .captures(reference)
        .or_else(|| URI_REGEX.captures(reference));

    if let Some(caps) = captures {
        let kind = caps[1]
            .parse::<ContentKind>()
            .map_err(|_| Error::InvalidReference(reference.to_string()))?;
        return Ok(ContentRef::new(&caps[2], kind));
    }

    if BARE_ID_REGEX.is_match(reference) {
        return Ok(ContentRef::new(reference, ContentKind::Track));
    }

    Err(Error::InvalidReference(reference.to_string()))
}
