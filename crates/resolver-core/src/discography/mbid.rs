use uuid::Uuid;

/// Parses a MusicBrainz identifier read from a tag.
///
/// Anything that is not a UUID becomes `None`; a malformed tag is not an error.
pub fn normalize_mbid(value: Option<&str>) -> Option<Uuid> {
    value.and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}
